//! The single-page UI. Everything the page needs ships inline; the feed is
//! an MJPEG `<img>` and the glyph/chart/status come from the event stream.

pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Emotion Detector</title>
<style>
  body {
    font-family: system-ui, sans-serif;
    max-width: 720px;
    margin: 0 auto;
    padding: 16px;
    background: #0f172a;
    color: #e2e8f0;
    text-align: center;
  }
  .title { font-size: 32px; font-weight: 700; color: #3B82F6; }
  .emotion { font-size: 24px; font-weight: 600; color: #22C55E; min-height: 32px; }
  .status { color: #94a3b8; min-height: 20px; }
  #feed { max-width: 100%; border-radius: 8px; background: #1e293b; min-height: 240px; }
  #chart { margin-top: 12px; text-align: left; }
  .bar-row { display: flex; align-items: center; margin: 2px 0; }
  .bar-label { width: 90px; font-size: 14px; text-transform: capitalize; }
  .bar {
    height: 16px;
    background: #3B82F6;
    border-radius: 3px;
    min-width: 2px;
    transition: width 0.2s;
  }
  .bar-value { font-size: 12px; margin-left: 6px; color: #94a3b8; }
  button {
    font-size: 16px;
    padding: 8px 20px;
    margin: 10px 6px;
    border: 0;
    border-radius: 6px;
    cursor: pointer;
  }
  #start { background: #22C55E; color: #052e16; }
  #stop { background: #ef4444; color: #450a0a; }
</style>
</head>
<body>
  <div class="title">🧠 Real-Time Emotion Detection</div>
  <p>Detect your emotions in real-time using your webcam 💡</p>
  <img id="feed" src="/stream.mjpg" alt="webcam feed">
  <div class="emotion" id="emotion"></div>
  <div class="status" id="status"></div>
  <div id="chart"></div>
  <div>
    <button id="start">▶️ Start Webcam</button>
    <button id="stop">⏹️ Stop Webcam</button>
  </div>
<script>
  const emotion = document.getElementById('emotion');
  const status = document.getElementById('status');
  const chart = document.getElementById('chart');

  document.getElementById('start').onclick = () => fetch('/start', {method: 'POST'});
  document.getElementById('stop').onclick = () => fetch('/stop', {method: 'POST'});

  const events = new EventSource('/events');
  events.onmessage = (msg) => {
    const panel = JSON.parse(msg.data);
    emotion.textContent = panel.glyph ? 'Current Emotion: ' + panel.glyph : '';
    status.textContent = panel.status;
    chart.replaceChildren(...panel.scores.map(({label, confidence}) => {
      const row = document.createElement('div');
      row.className = 'bar-row';
      const name = document.createElement('div');
      name.className = 'bar-label';
      name.textContent = label;
      const bar = document.createElement('div');
      bar.className = 'bar';
      bar.style.width = Math.max(1, confidence) + '%';
      const value = document.createElement('div');
      value.className = 'bar-value';
      value.textContent = confidence.toFixed(1);
      row.append(name, bar, value);
      return row;
    }));
  };
</script>
</body>
</html>
"#;
