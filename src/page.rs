use axum::response::Html;

/// The player page. Everything the browser needs is inlined so the binary
/// stays self-contained; playback itself happens in an embedded YouTube
/// IFrame player, the backend only serves search and download.
pub async fn web_interface() -> Html<&'static str> {
    Html(r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>YTM Player</title>
    <style>
        :root {
            --primary: #ff3355;
            --bg: #141418;
            --surface: #1f1f26;
            --text: #e0e0e0;
        }
        body {
            background-color: var(--bg);
            color: var(--text);
            font-family: system-ui, -apple-system, sans-serif;
            margin: 0;
            min-height: 100vh;
            display: flex;
            flex-direction: column;
            align-items: center;
        }
        header {
            width: 100%;
            max-width: 720px;
            padding: 2rem 1rem 1rem;
            box-sizing: border-box;
            text-align: center;
        }
        h1 { margin: 0 0 1rem 0; color: var(--primary); font-weight: 700; letter-spacing: -0.5px; }

        .search-bar {
            display: flex;
            gap: 0.5rem;
        }
        #searchInput {
            flex-grow: 1;
            padding: 0.8rem 1rem;
            font-size: 1rem;
            background: #2a2a33;
            border: 1px solid #444;
            color: #fff;
            border-radius: 0.5rem;
            outline: none;
        }
        #searchInput:focus { border-color: var(--primary); }
        #searchBtn {
            background: var(--primary);
            border: none;
            border-radius: 0.5rem;
            color: #fff;
            padding: 0 1.2rem;
            font-size: 1rem;
            cursor: pointer;
        }
        #searchBtn:hover { filter: brightness(1.1); }

        .status { font-size: 0.9rem; opacity: 0.7; min-height: 1.2em; margin-top: 0.8rem; }

        #results {
            width: 100%;
            max-width: 720px;
            padding: 0 1rem 8rem;
            box-sizing: border-box;
        }
        .result-item {
            display: flex;
            align-items: center;
            gap: 1rem;
            padding: 0.7rem;
            border-bottom: 1px solid #2c2c35;
            border-radius: 0.5rem;
            cursor: pointer;
            transition: background 0.2s;
        }
        .result-item:hover { background: #26262f; }
        .result-item.active { background: #2c2c38; }
        .result-thumb {
            width: 48px;
            height: 48px;
            border-radius: 0.4rem;
            object-fit: cover;
            background: #000;
            flex-shrink: 0;
        }
        .result-info { flex-grow: 1; min-width: 0; text-align: left; }
        .result-title {
            font-weight: bold; color: #fff;
            white-space: nowrap; overflow: hidden; text-overflow: ellipsis;
        }
        .result-artist { color: var(--primary); font-size: 0.9rem; }
        .result-duration { font-size: 0.8rem; color: #888; }
        .dl-btn {
            background: none;
            border: 1px solid #555;
            border-radius: 0.4rem;
            color: #aaa;
            padding: 0.3rem 0.6rem;
            cursor: pointer;
            flex-shrink: 0;
        }
        .dl-btn:hover { border-color: var(--primary); color: var(--primary); }

        /* Player bar */
        .player-bar {
            position: fixed;
            left: 0; right: 0; bottom: 0;
            background: var(--surface);
            border-top: 1px solid #2c2c35;
            display: flex;
            align-items: center;
            gap: 1rem;
            padding: 0.8rem 1rem;
            box-shadow: 0 -6px 20px rgba(0,0,0,0.5);
        }
        .player-bar img {
            width: 52px; height: 52px;
            border-radius: 0.4rem;
            object-fit: cover;
            background: #000;
        }
        .now-playing { flex-grow: 1; min-width: 0; }
        .now-playing .np-title {
            color: #fff; font-weight: bold;
            white-space: nowrap; overflow: hidden; text-overflow: ellipsis;
        }
        .now-playing .np-artist { color: var(--primary); font-size: 0.85rem; }
        .controls { display: flex; gap: 0.6rem; }
        .controls button {
            background: var(--primary);
            border: none;
            border-radius: 50%;
            width: 42px; height: 42px;
            cursor: pointer;
            color: #fff;
            display: flex;
            align-items: center;
            justify-content: center;
            transition: transform 0.1s, filter 0.1s;
        }
        .controls button:hover { filter: brightness(1.1); transform: scale(1.05); }
        .controls button:active { transform: scale(0.95); }
        .controls button svg { width: 22px; height: 22px; fill: currentColor; }

        /* The embedded player is audio-only as far as the UI is concerned */
        #yt-player { position: absolute; left: -9999px; width: 1px; height: 1px; }

        ::-webkit-scrollbar { width: 8px; }
        ::-webkit-scrollbar-track { background: #1a1a20; }
        ::-webkit-scrollbar-thumb { background: #555; border-radius: 4px; }
        ::-webkit-scrollbar-thumb:hover { background: var(--primary); }
    </style>
</head>
<body>
    <header>
        <h1>YTM Player</h1>
        <div class="search-bar">
            <input type="text" id="searchInput" placeholder="Search songs, artists..." autofocus>
            <button id="searchBtn">Search</button>
        </div>
        <div class="status" id="status">Type something and hit Search</div>
    </header>

    <div id="results"></div>

    <div class="player-bar">
        <img id="npThumb" alt="">
        <div class="now-playing">
            <div class="np-title" id="npTitle">Nothing playing</div>
            <div class="np-artist" id="npArtist"></div>
        </div>
        <div class="controls">
            <button id="prevBtn" title="Previous">
                <svg viewBox="0 0 24 24"><path d="M6 6h2v12H6zm3.5 6l8.5 6V6z"/></svg>
            </button>
            <button id="playBtn" title="Play/Pause">
                <svg viewBox="0 0 24 24"><path d="M8 5v14l11-7z"/></svg>
            </button>
            <button id="nextBtn" title="Next">
                <svg viewBox="0 0 24 24"><path d="M6 18l8.5-6L6 6v12zM16 6v12h2V6h-2z"/></svg>
            </button>
        </div>
    </div>

    <div id="yt-player"></div>

    <script>
        const searchInput = document.getElementById('searchInput');
        const searchBtn = document.getElementById('searchBtn');
        const results = document.getElementById('results');
        const status = document.getElementById('status');
        const npThumb = document.getElementById('npThumb');
        const npTitle = document.getElementById('npTitle');
        const npArtist = document.getElementById('npArtist');
        const playBtn = document.getElementById('playBtn');
        const prevBtn = document.getElementById('prevBtn');
        const nextBtn = document.getElementById('nextBtn');

        const playIcon = '<svg viewBox="0 0 24 24"><path d="M8 5v14l11-7z"/></svg>';
        const pauseIcon = '<svg viewBox="0 0 24 24"><path d="M6 19h4V5H6v14zm8-14v14h4V5h-4z"/></svg>';

        let playlist = [];
        let currentIndex = 0;
        let isPlaying = false;
        let player = null;
        let playerReady = false;

        // YouTube IFrame API bootstrap
        const tag = document.createElement('script');
        tag.src = 'https://www.youtube.com/iframe_api';
        document.head.appendChild(tag);

        window.onYouTubeIframeAPIReady = () => {
            player = new YT.Player('yt-player', {
                height: '1',
                width: '1',
                playerVars: { playsinline: 1, controls: 0, rel: 0 },
                events: {
                    onReady: () => { playerReady = true; },
                    onStateChange: (event) => {
                        if (event.data === YT.PlayerState.ENDED) nextTrack();
                        if (event.data === YT.PlayerState.PLAYING) setPlaying(true);
                        if (event.data === YT.PlayerState.PAUSED) setPlaying(false);
                    },
                    onError: () => nextTrack()
                }
            });
        };

        function setPlaying(playing) {
            isPlaying = playing;
            playBtn.innerHTML = playing ? pauseIcon : playIcon;
        }

        async function runSearch() {
            const q = searchInput.value.trim();
            if (!q) return;
            status.textContent = 'Searching...';
            results.innerHTML = '';
            try {
                const resp = await fetch(`/api/search?q=${encodeURIComponent(q)}&limit=25`);
                if (!resp.ok) {
                    const body = await resp.json();
                    throw new Error(body.message || body.error || 'Search failed');
                }
                playlist = await resp.json();
                renderResults();
                status.textContent = playlist.length
                    ? `${playlist.length} results`
                    : 'No songs found, try another query';
            } catch (err) {
                status.textContent = 'Search failed: ' + err.message;
            }
        }

        function renderResults() {
            results.innerHTML = playlist.map((t, i) => `
                <div class="result-item" id="track-${i}" onclick="playTrack(${i})">
                    <img class="result-thumb" src="${t.thumbnail}" alt="" loading="lazy">
                    <div class="result-info">
                        <div class="result-title">${escapeHtml(t.title)}</div>
                        <div class="result-artist">${escapeHtml(t.artist)}</div>
                    </div>
                    <div class="result-duration">${formatDuration(t.duration)}</div>
                    <button class="dl-btn" onclick="event.stopPropagation(); downloadTrack('${t.videoId}')">MP3</button>
                </div>
            `).join('');
        }

        window.playTrack = function(index) {
            if (!playlist.length || !playerReady) return;
            currentIndex = index;
            const track = playlist[currentIndex];
            player.loadVideoById(track.videoId);
            npThumb.src = track.thumbnail;
            npTitle.textContent = track.title;
            npArtist.textContent = track.artist;
            document.querySelectorAll('.result-item').forEach(el => el.classList.remove('active'));
            const row = document.getElementById('track-' + currentIndex);
            if (row) row.classList.add('active');
            setPlaying(true);
        };

        function nextTrack() {
            if (!playlist.length) return;
            playTrack((currentIndex + 1) % playlist.length);
        }

        function prevTrack() {
            if (!playlist.length) return;
            playTrack((currentIndex - 1 + playlist.length) % playlist.length);
        }

        window.downloadTrack = async function(videoId) {
            // The backend either streams the file or answers with JSON
            // instructions, depending on how it is deployed.
            status.textContent = 'Preparing download...';
            const resp = await fetch(`/api/download/${videoId}`);
            const type = resp.headers.get('content-type') || '';

            if (type.includes('application/json')) {
                const body = await resp.json();
                status.textContent = '';
                if (body.externalUrl) {
                    alert((body.message || 'Download unavailable') + '\n\n' + (body.instructions || []).join('\n'));
                    window.open(body.externalUrl, '_blank');
                } else {
                    alert(body.message || body.error || 'Download failed');
                }
                return;
            }

            const disposition = resp.headers.get('content-disposition') || '';
            const match = disposition.match(/filename="(.+)"/);
            const blob = await resp.blob();
            const link = document.createElement('a');
            link.href = URL.createObjectURL(blob);
            link.download = match ? match[1] : 'track.mp3';
            link.click();
            URL.revokeObjectURL(link.href);
            status.textContent = '';
        };

        playBtn.addEventListener('click', () => {
            if (!playerReady || !playlist.length) return;
            if (isPlaying) { player.pauseVideo(); } else { player.playVideo(); }
        });
        nextBtn.addEventListener('click', nextTrack);
        prevBtn.addEventListener('click', prevTrack);
        searchBtn.addEventListener('click', runSearch);
        searchInput.addEventListener('keydown', (e) => {
            if (e.key === 'Enter') runSearch();
        });

        function formatDuration(value) {
            if (typeof value !== 'number') return value || 'Unknown';
            const mins = Math.floor(value / 60);
            const secs = value % 60;
            return `${mins}:${secs.toString().padStart(2, '0')}`;
        }

        function escapeHtml(text) {
            const div = document.createElement('div');
            div.textContent = text;
            return div.innerHTML;
        }
    </script>
</body>
</html>
    "#)
}
