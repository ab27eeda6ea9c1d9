//! Embedded front end for the dashboard.
//!
//! A single page: folder tree with checkboxes, a button that requests a
//! chart for the selection, and a list of chart panels that can be renamed,
//! removed or downloaded as SVG. Panels live only in page memory.

pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>autocov: automation coverage</title>
<style>
  body { font-family: system-ui, -apple-system, sans-serif; margin: 0; display: flex; height: 100vh; }
  #tree { width: 340px; overflow: auto; border-right: 1px solid #ddd; padding: 12px; }
  #tree ul { list-style: none; padding-left: 16px; margin: 0; }
  #main { flex: 1; overflow: auto; padding: 12px; }
  .panel { display: inline-block; border: 1px solid #ddd; border-radius: 6px; margin: 8px; padding: 8px; vertical-align: top; }
  .panel h3 { margin: 0 0 6px; font-size: 15px; }
  .panel button { margin-right: 4px; }
  .error { color: #c0392b; }
</style>
</head>
<body>
<div id="tree"><button id="load">Load folders</button><div id="folders"></div></div>
<div id="main">
  <input id="title" placeholder="Chart title" value="Automation coverage">
  <button id="generate">Generate chart</button>
  <span id="status"></span>
  <div id="panels"></div>
</div>
<script>
const $ = (id) => document.getElementById(id);

function renderNodes(nodes) {
  const ul = document.createElement('ul');
  for (const node of nodes) {
    const li = document.createElement('li');
    const label = document.createElement('label');
    const box = document.createElement('input');
    box.type = 'checkbox';
    box.value = node.id;
    label.append(box, ' ', node.name);
    li.append(label);
    if (node.children.length) li.append(renderNodes(node.children));
    ul.append(li);
  }
  return ul;
}

async function post(path, body) {
  const res = await fetch(path, {
    method: 'POST',
    headers: { 'content-type': 'application/json' },
    body: JSON.stringify(body),
  });
  if (!res.ok) {
    const err = await res.json().catch(() => ({ error: res.statusText }));
    throw new Error(err.details ? `${err.error}: ${err.details}` : err.error);
  }
  return res;
}

$('load').onclick = async () => {
  $('folders').textContent = 'Loading…';
  try {
    const tree = await (await post('/sections', {})).json();
    $('folders').replaceChildren(renderNodes(tree));
  } catch (e) {
    $('folders').innerHTML = '';
    $('folders').append(Object.assign(document.createElement('p'), { className: 'error', textContent: e.message }));
  }
};

$('generate').onclick = async () => {
  const folderIds = [...document.querySelectorAll('#folders input:checked')].map((b) => Number(b.value));
  const title = $('title').value;
  $('status').textContent = 'Computing…';
  try {
    const svg = await (await post('/coverage/chart', { folderIds, title })).text();
    addPanel(title, svg);
    $('status').textContent = '';
  } catch (e) {
    $('status').textContent = e.message;
  }
};

function addPanel(title, svg) {
  const panel = document.createElement('div');
  panel.className = 'panel';
  const heading = Object.assign(document.createElement('h3'), { textContent: title });
  const chart = document.createElement('div');
  chart.innerHTML = svg;
  const rename = Object.assign(document.createElement('button'), { textContent: 'Rename' });
  rename.onclick = () => {
    const next = prompt('Chart name', heading.textContent);
    if (next) heading.textContent = next;
  };
  const remove = Object.assign(document.createElement('button'), { textContent: 'Remove' });
  remove.onclick = () => panel.remove();
  const download = Object.assign(document.createElement('button'), { textContent: 'Download SVG' });
  download.onclick = () => {
    const url = URL.createObjectURL(new Blob([chart.innerHTML], { type: 'image/svg+xml' }));
    Object.assign(document.createElement('a'), { href: url, download: `${heading.textContent}.svg` }).click();
    URL.revokeObjectURL(url);
  };
  panel.append(heading, chart, rename, remove, download);
  $('panels').prepend(panel);
}
</script>
</body>
</html>
"##;
