//! HTML reporter: generates a single self-contained interactive report page
//!
//! The Suite → Class → Case tree and the sidebar navigation tree are rendered
//! server-side; the report data is embedded once as `REPORT` and a vanilla JS
//! block drives search, status filtering, sorting, collapsing, sidebar
//! navigation and the per-test detail panels.

use super::embed::{self, SCRIPT_PREFIX};
use super::format_duration;
use crate::{Report, Status, StatusCounts, TestCaseRecord};

/// Escape text for HTML element content and double-quoted attributes
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Reporter that generates the HTML document
pub struct HtmlReporter;

impl HtmlReporter {
    pub fn new() -> Self {
        Self
    }

    /// Generate the full HTML report
    pub fn report(&self, report: &Report) -> Result<String, serde_json::Error> {
        let data = embed::serialize(report)?;
        let mut html = String::with_capacity(32_768 + report.test_count() * 256);
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n");
        html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
        html.push_str("<title>");
        html.push_str(&escape_html(report.title()));
        html.push_str("</title>\n");
        html.push_str(Self::template_style());
        html.push_str("</head>\n<body>\n<div class=\"shell\">\n");
        self.render_header(&mut html, report);
        self.render_controls(&mut html, report);
        html.push_str("  <div class=\"layout\">\n");
        self.render_sidebar(&mut html, report);
        html.push_str("  <div class=\"content\">\n");
        self.render_tree(&mut html, report);
        html.push_str("  </div>\n  </div>\n");
        html.push_str("</div>\n<script>\n");
        html.push_str(SCRIPT_PREFIX);
        html.push_str(&data);
        html.push_str(";\n");
        html.push_str(&severity_table());
        html.push_str(Self::template_script());
        html.push_str("</script>\n</body>\n</html>\n");
        Ok(html)
    }

    fn render_header(&self, html: &mut String, report: &Report) {
        let counts = report.counts();
        html.push_str("  <header>\n    <h1>");
        html.push_str(&escape_html(report.title()));
        html.push_str("</h1>\n    <span class=\"meta\">Generated ");
        html.push_str(
            &report
                .generated_at()
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string(),
        );
        html.push_str(&format!(
            " · {} suite{}</span>\n  </header>\n",
            report.suites().len(),
            if report.suites().len() == 1 { "" } else { "s" }
        ));

        html.push_str("  <div class=\"stats-bar\">\n");
        let stat = |html: &mut String, value: String, label: &str, class: &str| {
            html.push_str(&format!(
                "    <div class=\"stat\"><span class=\"val {}\">{}</span><span class=\"lbl\">{}</span></div>\n",
                class, value, label
            ));
        };
        stat(html, counts.total().to_string(), "Tests", "");
        stat(html, counts.passed.to_string(), "Passed", "st-passed");
        stat(html, counts.failed.to_string(), "Failed", "st-failed");
        stat(html, counts.error.to_string(), "Errors", "st-error");
        stat(html, counts.skipped.to_string(), "Skipped", "st-skipped");
        stat(html, format_duration(report.duration()), "Duration", "");
        html.push_str("  </div>\n");
    }

    fn render_controls(&self, html: &mut String, report: &Report) {
        let counts = report.counts();
        html.push_str("  <div class=\"controls\">\n");
        html.push_str("    <input type=\"search\" class=\"search\" id=\"search\" placeholder=\"Search tests, classes, suites…\" autocomplete=\"off\">\n");
        html.push_str("    <div class=\"pill-group\" id=\"status-filter\">\n");
        for status in Status::ALL {
            html.push_str(&format!(
                "      <button type=\"button\" class=\"pill active\" data-status=\"{}\" data-code=\"{}\" aria-pressed=\"true\"><span class=\"st st-{}\">{}</span> {}</button>\n",
                status.as_str(),
                status.code(),
                status.as_str(),
                status.label(),
                counts.get(status)
            ));
        }
        html.push_str("    </div>\n");
        html.push_str(
            r#"    <select class="sort-sel" id="sort-key">
      <option value="">Original order</option>
      <option value="status">Status</option>
      <option value="duration">Duration</option>
      <option value="name">Name</option>
    </select>
    <button type="button" class="sort-dir" id="sort-dir" data-dir="asc">Ascending</button>
"#,
        );
        html.push_str(&format!(
            "    <span class=\"count-badge\" id=\"count-badge\">{0} of {0} tests</span>\n  </div>\n",
            counts.total()
        ));
    }

    /// Navigation tree mirroring the main tree, keyed by the same indices
    fn render_sidebar(&self, html: &mut String, report: &Report) {
        html.push_str("  <nav class=\"sidebar\" id=\"sidebar\" aria-label=\"Test structure\">\n");
        html.push_str("    <div class=\"sidebar-title\">Test Structure</div>\n");
        html.push_str("    <input type=\"search\" class=\"search\" id=\"sidebar-search\" placeholder=\"Filter tree…\" autocomplete=\"off\">\n");
        html.push_str("    <ul class=\"nav\" id=\"nav\">\n");
        for (si, suite) in report.suites().iter().enumerate() {
            html.push_str(&format!("<li class=\"nav-suite\" data-s=\"{}\">", si));
            html.push_str(&nav_label(suite.name(), None));
            html.push_str("<ul>\n");
            for (ci, class) in suite.classes().iter().enumerate() {
                html.push_str(&format!(
                    "<li class=\"nav-class\" data-s=\"{}\" data-c=\"{}\">",
                    si, ci
                ));
                html.push_str(&nav_label(class.classname(), None));
                html.push_str("<ul>\n");
                for (ti, case) in class.cases().iter().enumerate() {
                    html.push_str(&format!(
                        "<li class=\"nav-case\" data-s=\"{}\" data-c=\"{}\" data-t=\"{}\">",
                        si, ci, ti
                    ));
                    html.push_str(&nav_label(&case.name, Some(case.status)));
                    html.push_str("</li>\n");
                }
                html.push_str("</ul></li>\n");
            }
            html.push_str("</ul></li>\n");
        }
        html.push_str("    </ul>\n  </nav>\n");
    }

    fn render_tree(&self, html: &mut String, report: &Report) {
        html.push_str("  <main class=\"tree\" id=\"tree\">\n");
        for (si, suite) in report.suites().iter().enumerate() {
            html.push_str(&format!("<section class=\"suite\" data-s=\"{}\">", si));
            render_node_header(html, suite.name(), suite.counts(), suite.duration());
            html.push_str("<div class=\"node-body\">\n");
            for (ci, class) in suite.classes().iter().enumerate() {
                html.push_str(&format!(
                    "<section class=\"class\" data-s=\"{}\" data-c=\"{}\">",
                    si, ci
                ));
                render_node_header(html, class.classname(), class.counts(), class.duration());
                html.push_str("<div class=\"node-body\">\n");
                for (ti, case) in class.cases().iter().enumerate() {
                    html.push_str(&render_case_row(si, ci, ti, case));
                    html.push('\n');
                }
                html.push_str("</div></section>\n");
            }
            html.push_str("</div></section>\n");
        }
        html.push_str("  </main>\n");
        html.push_str(&format!(
            "  <div class=\"empty\" id=\"empty\"{}>No tests match the current filters.</div>\n",
            if report.is_empty() { "" } else { " hidden" }
        ));
    }

    fn template_style() -> &'static str {
        r##"<style>
:root{--bg:#0d0d11;--surface:#16161b;--surface2:#1e1e24;--border:#2a2a32;--text:#e4e4e7;--muted:#71717a;--green:#22c55e;--yellow:#eab308;--orange:#f97316;--red:#ef4444;--blue:#3b82f6;--radius:8px}
*{box-sizing:border-box;margin:0;padding:0}
body{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,Oxygen,sans-serif;background:var(--bg);color:var(--text);line-height:1.5;min-height:100vh}
::selection{background:var(--blue);color:#fff}

/* ── Layout ── */
.shell{max-width:1200px;margin:0 auto}
header{padding:1.25rem 1.5rem;border-bottom:1px solid var(--border);display:flex;align-items:baseline;gap:1.5rem;flex-wrap:wrap}
header h1{font-size:1.125rem;font-weight:700}
header .meta{font-size:.8125rem;color:var(--muted)}

/* ── Stats bar ── */
.stats-bar{display:flex;border-bottom:1px solid var(--border);background:var(--surface)}
.stat{flex:1;padding:.875rem 1.25rem;border-right:1px solid var(--border);text-align:center}
.stat:last-child{border-right:none}
.stat .val{font-size:1.5rem;font-weight:700;display:block}
.stat .lbl{font-size:.75rem;color:var(--muted);text-transform:uppercase;letter-spacing:.5px}

/* ── Controls ── */
.controls{padding:1rem 1.5rem;border-bottom:1px solid var(--border);display:flex;gap:.75rem;flex-wrap:wrap;align-items:center}
.search{background:var(--surface);border:1px solid var(--border);border-radius:var(--radius);padding:.5rem .75rem;color:var(--text);font-size:.8125rem;width:260px;outline:none}
.search:focus{border-color:var(--blue)}
.pill-group{display:flex;gap:2px;background:var(--surface);border-radius:var(--radius);padding:2px;border:1px solid var(--border)}
.pill{padding:.3rem .7rem;font-size:.75rem;font-weight:600;border-radius:6px;cursor:pointer;border:none;background:transparent;color:var(--muted);opacity:.45}
.pill.active{background:var(--surface2);color:var(--text);opacity:1}
.sort-sel,.sort-dir{background:var(--surface);border:1px solid var(--border);border-radius:var(--radius);padding:.45rem .6rem;color:var(--text);font-size:.8125rem;cursor:pointer}
.count-badge{font-size:.75rem;color:var(--muted);margin-left:auto;white-space:nowrap}

/* ── Tree ── */
.tree{padding:1rem 1.5rem}
.suite{margin-bottom:.75rem;border:1px solid var(--border);border-radius:var(--radius);overflow:hidden}
.class{border-top:1px solid var(--border)}
.node-hdr{display:flex;align-items:center;gap:.5rem;padding:.5rem .75rem;background:var(--surface);cursor:pointer;user-select:none}
.node-hdr:hover{background:var(--surface2)}
.class>.node-hdr{padding-left:1.75rem;background:transparent}
.node-hdr .chevron{font-size:.625rem;color:var(--muted);width:12px;transition:transform .2s;transform:rotate(90deg)}
.collapsed>.node-hdr .chevron{transform:none}
.collapsed>.node-body{display:none}
.node-hdr .node-name{font-size:.8125rem;font-weight:600;flex:1;overflow:hidden;text-overflow:ellipsis;white-space:nowrap}
.node-hdr .chip{font-size:.6875rem;font-weight:600;padding:.05rem .45rem;border-radius:10px;background:var(--surface2)}
.dur{font-size:.75rem;color:var(--muted);font-variant-numeric:tabular-nums;white-space:nowrap}

/* ── Case rows ── */
.case{display:flex;flex-wrap:wrap;align-items:center;gap:.5rem;padding:.35rem .75rem .35rem 3rem;border-top:1px solid var(--border);font-size:.8125rem;outline:none}
.case:hover,.case:focus{background:var(--surface2)}
.case .case-name{flex:1;overflow:hidden;text-overflow:ellipsis;white-space:nowrap}
.st{font-size:.6875rem;font-weight:700;padding:.1rem .375rem;border-radius:4px;min-width:3.25rem;text-align:center}
.st-passed{color:var(--green)}
.st-failed{color:var(--red)}
.st-error{color:var(--orange)}
.st-skipped{color:var(--yellow)}
.case .st.st-passed{background:rgba(34,197,94,.12)}
.case .st.st-failed{background:rgba(239,68,68,.15)}
.case .st.st-error{background:rgba(249,115,22,.15)}
.case .st.st-skipped{background:rgba(234,179,8,.12)}
.case-detail{flex-basis:100%;background:var(--surface);border:1px solid var(--border);border-radius:6px;padding:.5rem .75rem;margin:.25rem 0;cursor:text}
.case-detail .msg{font-weight:600;margin-bottom:.25rem;white-space:pre-wrap;word-break:break-word}
.case-detail pre{font-family:'SF Mono',Consolas,monospace;font-size:.75rem;color:var(--muted);white-space:pre-wrap;word-break:break-word;max-height:24rem;overflow:auto}

/* ── Sidebar ── */
.layout{display:flex;align-items:flex-start}
.sidebar{width:260px;flex-shrink:0;position:sticky;top:0;max-height:100vh;overflow:auto;padding:1rem .75rem;border-right:1px solid var(--border)}
.sidebar-title{font-size:.75rem;font-weight:700;color:var(--muted);text-transform:uppercase;letter-spacing:.5px;margin-bottom:.5rem}
.sidebar .search{width:100%;margin-bottom:.5rem}
.nav,.nav ul{list-style:none}
.nav ul{padding-left:.875rem}
.nav li.collapsed>ul{display:none}
.nav-label{display:flex;align-items:center;gap:.375rem;padding:.2rem .375rem;border-radius:4px;font-size:.75rem;cursor:pointer;outline:none;white-space:nowrap}
.nav-label:hover,.nav-label:focus{background:var(--surface2)}
.nav-toggle{width:10px;color:var(--muted);transition:transform .2s}
.collapsed>.nav-label .nav-toggle{transform:rotate(-90deg)}
.nav-text{overflow:hidden;text-overflow:ellipsis}
.nav-suite>.nav-label{font-weight:600}
.dot{width:7px;height:7px;border-radius:50%;background:currentColor;flex-shrink:0}
.content{flex:1;min-width:0}
.highlighted{box-shadow:inset 3px 0 0 var(--blue);background:var(--surface2)}

/* ── Empty state ── */
.empty{text-align:center;padding:3rem 1rem;color:var(--muted);font-size:.875rem}
</style>
"##
    }

    fn template_script() -> &'static str {
        r##"(function(){
"use strict";

/* ── helpers ── */
const $=s=>document.querySelector(s);
const kids=(el,sel)=>[...el.children].filter(c=>c.matches(sel));
/* SEV is emitted ahead of this block, indexed by status code */
const worst=a=>Math.max(0,...[0,1,2,3].filter(k=>a[k]>0).map(k=>SEV[k]));
const TOTAL=REPORT.totals[0]+REPORT.totals[1]+REPORT.totals[2]+REPORT.totals[3];

/* ── state ── */
const state={query:'',enabled:[true,true,true,true],key:'',dir:'asc'};

/* ── index the rendered trees ── */
const tree=$('#tree'), navRoot=$('#nav');
const nav={};
navRoot.querySelectorAll('li').forEach(li=>{
  const d=li.dataset;
  nav[[d.s,d.c,d.t].filter(x=>x!==undefined).join('.')]=li;
});
const navList=li=>kids(li,'ul')[0];
const model=kids(tree,'.suite').map(sEl=>{
  const si=+sEl.dataset.s, s=REPORT.suites[si];
  const body=kids(sEl,'.node-body')[0];
  const classes=kids(body,'.class').map(cEl=>{
    const ci=+cEl.dataset.c, c=s.classes[ci];
    const cBody=kids(cEl,'.node-body')[0];
    const cases=kids(cBody,'.case').map(tEl=>{
      const ti=+tEl.dataset.t, t=c.cases[ti];
      return {el:tEl,nav:nav[si+'.'+ci+'.'+ti],idx:ti,code:t[1],sev:SEV[t[1]],dur:t[2],key:t[0].toLowerCase(),msg:t[3],det:t[4]};
    });
    return {el:cEl,nav:nav[si+'.'+ci],body:cBody,idx:ci,sev:worst(c.a),dur:c.a[4],key:c.n.toLowerCase(),cases};
  });
  return {el:sEl,nav:nav[si],body,idx:si,sev:worst(s.a),dur:s.a[4],key:s.n.toLowerCase(),classes};
});

/* ── sort: equal keys fall back to original position ── */
function cmp(a,b){
  let d=0;
  if(state.key==='status') d=a.sev-b.sev;
  else if(state.key==='duration') d=a.dur-b.dur;
  else if(state.key==='name') d=a.key<b.key?-1:a.key>b.key?1:0;
  if(state.dir==='desc') d=-d;
  return d||a.idx-b.idx;
}
function reorder(parent,items,pick){
  for(const it of [...items].sort(cmp)) parent.appendChild(pick(it));
}
const inMain=it=>it.el, inNav=it=>it.nav;

/* ── visibility + order ── */
function apply(){
  const q=state.query.trim().toLowerCase();
  let shown=0;
  for(const s of model){
    let suiteVisible=false;
    for(const c of s.classes){
      let classVisible=false;
      for(const t of c.cases){
        const v=state.enabled[t.code]&&(!q||t.key.includes(q)||c.key.includes(q)||s.key.includes(q));
        t.el.style.display=t.nav.style.display=v?'':'none';
        if(v){classVisible=true;shown++}
      }
      c.el.style.display=c.nav.style.display=classVisible?'':'none';
      if(classVisible) suiteVisible=true;
      reorder(c.body,c.cases,inMain);
      reorder(navList(c.nav),c.cases,inNav);
    }
    s.el.style.display=s.nav.style.display=suiteVisible?'':'none';
    reorder(s.body,s.classes,inMain);
    reorder(navList(s.nav),s.classes,inNav);
  }
  reorder(tree,model,inMain);
  reorder(navRoot,model,inNav);
  $('#count-badge').textContent=shown+' of '+TOTAL+' tests';
  $('#empty').hidden=shown>0;
}

/* ── detail panels, created on expand ── */
function toggleDetail(t){
  const open=kids(t.el,'.case-detail')[0];
  if(open){open.remove();t.el.removeAttribute('aria-expanded');return}
  const panel=document.createElement('div');
  panel.className='case-detail';
  if(t.msg){const m=document.createElement('div');m.className='msg';m.textContent=t.msg;panel.appendChild(m)}
  if(t.det){const pre=document.createElement('pre');pre.textContent=t.det;panel.appendChild(pre)}
  t.el.appendChild(panel);
  t.el.setAttribute('aria-expanded','true');
}
for(const s of model) for(const c of s.classes) for(const t of c.cases){
  if(!t.msg&&!t.det) continue;
  t.el.addEventListener('click',e=>{if(!e.target.closest('.case-detail')) toggleDetail(t)});
  t.el.addEventListener('keydown',e=>{
    if(e.target!==t.el) return;
    if(e.key==='Enter'||e.key===' '){e.preventDefault();toggleDetail(t)}
  });
}

/* ── collapsible suite / class headers ── */
document.querySelectorAll('.node-hdr').forEach(h=>{
  const flip=()=>{
    const collapsed=h.parentElement.classList.toggle('collapsed');
    h.setAttribute('aria-expanded',collapsed?'false':'true');
  };
  h.addEventListener('click',flip);
  h.addEventListener('keydown',e=>{if(e.key==='Enter'||e.key===' '){e.preventDefault();flip()}});
});

/* ── sidebar navigation ── */
function reveal(el){
  for(let p=el.parentElement;p&&p!==tree;p=p.parentElement){
    if(!p.classList.contains('collapsed')) continue;
    p.classList.remove('collapsed');
    const h=kids(p,'.node-hdr')[0];
    if(h) h.setAttribute('aria-expanded','true');
  }
}
function goTo(target){
  tree.querySelectorAll('.highlighted').forEach(x=>x.classList.remove('highlighted'));
  reveal(target);
  target.classList.add('highlighted');
  target.scrollIntoView({behavior:'smooth',block:'center'});
}
function bindNav(item){
  const label=kids(item.nav,'.nav-label')[0];
  label.addEventListener('click',e=>{
    if(e.target.closest('.nav-toggle')){item.nav.classList.toggle('collapsed');return}
    goTo(item.el);
  });
  label.addEventListener('keydown',e=>{if(e.key==='Enter'){e.preventDefault();goTo(item.el)}});
}
for(const s of model){
  bindNav(s);
  for(const c of s.classes){bindNav(c);c.cases.forEach(bindNav)}
}

/* ── controls ── */
const searchBoxes=[$('#search'),$('#sidebar-search')];
searchBoxes.forEach(box=>box.addEventListener('input',()=>{
  state.query=box.value;
  for(const other of searchBoxes) if(other!==box) other.value=box.value;
  apply();
}));
document.querySelectorAll('#status-filter .pill').forEach(btn=>{
  btn.addEventListener('click',()=>{
    const code=+btn.dataset.code;
    state.enabled[code]=!state.enabled[code];
    btn.classList.toggle('active',state.enabled[code]);
    btn.setAttribute('aria-pressed',String(state.enabled[code]));
    apply();
  });
});
$('#sort-key').addEventListener('change',e=>{state.key=e.target.value;apply()});
$('#sort-dir').addEventListener('click',e=>{
  const btn=e.currentTarget;
  state.dir=state.dir==='asc'?'desc':'asc';
  btn.dataset.dir=state.dir;
  btn.textContent=state.dir==='asc'?'Ascending':'Descending';
  apply();
});

/* ── init ── */
apply();

})();
"##
    }
}

impl Default for HtmlReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a report with the default reporter
pub fn render(report: &Report) -> Result<String, serde_json::Error> {
    HtmlReporter::new().report(report)
}

/// `SEV` lookup for the page script: severity rank indexed by status code
fn severity_table() -> String {
    let mut ranks = [0u8; 4];
    for status in Status::ALL {
        ranks[status.code() as usize] = status.severity();
    }
    format!(
        "const SEV=[{}];\n",
        ranks.map(|r| r.to_string()).join(",")
    )
}

fn nav_label(text: &str, status: Option<Status>) -> String {
    let mut label = String::from("<div class=\"nav-label\" tabindex=\"0\">");
    match status {
        Some(status) => label.push_str(&format!("<span class=\"dot st-{}\"></span>", status.as_str())),
        None => label.push_str("<span class=\"nav-toggle\">▾</span>"),
    }
    label.push_str("<span class=\"nav-text\">");
    label.push_str(&escape_html(text));
    label.push_str("</span></div>");
    label
}

fn render_node_header(html: &mut String, name: &str, counts: StatusCounts, duration: f64) {
    html.push_str(
        "<div class=\"node-hdr\" tabindex=\"0\" aria-expanded=\"true\"><span class=\"chevron\">▶</span><span class=\"node-name\">",
    );
    html.push_str(&escape_html(name));
    html.push_str("</span>");
    for status in [Status::Error, Status::Failed, Status::Skipped, Status::Passed] {
        let n = counts.get(status);
        if n > 0 {
            html.push_str(&format!(
                "<span class=\"chip st-{}\">{} {}</span>",
                status.as_str(),
                n,
                status.as_str()
            ));
        }
    }
    html.push_str(&format!(
        "<span class=\"dur\">{}</span></div>",
        format_duration(duration)
    ));
}

/// Markup of one collapsed case row. Depends only on position, name, status
/// and duration, never on whether the case carries details.
pub(crate) fn render_case_row(si: usize, ci: usize, ti: usize, case: &TestCaseRecord) -> String {
    format!(
        "<div class=\"case\" data-s=\"{}\" data-c=\"{}\" data-t=\"{}\" tabindex=\"0\"><span class=\"st st-{}\">{}</span><span class=\"case-name\">{}</span><span class=\"dur\">{}</span></div>",
        si,
        ci,
        ti,
        case.status.as_str(),
        case.status.label(),
        escape_html(&case.name),
        format_duration(case.duration)
    )
}
