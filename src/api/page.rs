//! Single-page chat UI served at `/`.
//!
//! The page creates a session on load and drives the JSON API: a masked
//! API key field, a URL field and a message field (both disabled until a
//! key is set), and the rendered transcript.

pub const INDEX_HTML: &str = r##"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Website to Chatbot</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 760px; margin: 2rem auto; padding: 0 1rem; color: #222; }
  label { display: block; font-size: .9rem; margin: 1rem 0 .3rem; }
  input { width: 100%; box-sizing: border-box; padding: .55rem; font-size: 1rem; border: 1px solid #bbb; border-radius: 6px; }
  input:disabled { background: #f2f2f2; }
  #transcript { list-style: none; padding: 0; margin: 1rem 0; }
  #transcript li { padding: .6rem .8rem; border-radius: 10px; margin: .4rem 0; white-space: pre-wrap; max-width: 85%; }
  #transcript li.user { background: #dbeafe; margin-left: auto; }
  #transcript li.assistant { background: #f1f1f1; }
  #status { color: #666; font-style: italic; min-height: 1.2em; }
  hr { margin-top: 2rem; border: 0; border-top: 1px solid #ddd; }
</style>
</head>
<body>
<h1>Website to Chatbot</h1>

<label for="api-key">OpenAI API Key</label>
<input id="api-key" type="password" autocomplete="off">

<h2>Add a URL</h2>
<label for="url">Input URL</label>
<input id="url" type="url" disabled>

<h2>Chat</h2>
<ul id="transcript"></ul>
<div id="status"></div>

<label for="message">Message</label>
<input id="message" type="text" disabled>

<hr>

<script>
(function () {
  const api = "/api/v1/sessions";
  const keyInput = document.getElementById("api-key");
  const urlInput = document.getElementById("url");
  const messageInput = document.getElementById("message");
  const list = document.getElementById("transcript");
  const status = document.getElementById("status");
  let sessionId = null;

  async function call(method, path, body) {
    const resp = await fetch(path, {
      method: method,
      headers: { "Content-Type": "application/json" },
      body: body === undefined ? undefined : JSON.stringify(body)
    });
    const data = await resp.json().catch(function () { return {}; });
    if (!resp.ok) { throw new Error(data.message || ("HTTP " + resp.status)); }
    return data;
  }

  function setReady(ready) {
    urlInput.disabled = !ready;
    messageInput.disabled = !ready;
  }

  async function refresh() {
    const data = await call("GET", api + "/" + sessionId + "/transcript");
    list.replaceChildren();
    data.entries.forEach(function (entry) {
      const item = document.createElement("li");
      item.className = entry.role;
      item.dataset.key = entry.key;
      item.textContent = entry.text;
      list.appendChild(item);
    });
  }

  async function busy(label, action) {
    status.textContent = label;
    try { await action(); await refresh(); }
    catch (e) { status.textContent = e.message; return; }
    status.textContent = "";
  }

  keyInput.addEventListener("change", function () {
    busy("", async function () {
      const data = await call("PUT", api + "/" + sessionId + "/credential", { api_key: keyInput.value });
      setReady(data.has_credential);
      if (data.changed) { urlInput.value = ""; messageInput.value = ""; }
    });
  });

  urlInput.addEventListener("change", function () {
    const url = urlInput.value;
    busy("Ingesting content...", function () {
      return call("POST", api + "/" + sessionId + "/ingest", { url: url });
    });
  });

  messageInput.addEventListener("change", function () {
    const message = messageInput.value;
    messageInput.value = "";
    busy("Thinking...", function () {
      return call("POST", api + "/" + sessionId + "/messages", { message: message });
    });
  });

  call("POST", api, {}).then(function (data) {
    sessionId = data.session_id;
    if (data.has_credential) { keyInput.placeholder = "Using the server's default key"; }
    setReady(data.has_credential);
    return refresh();
  }).catch(function (e) { status.textContent = e.message; });
})();
</script>
</body>
</html>
"##;
