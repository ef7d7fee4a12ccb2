//! # Map rendering
//!
//! Produces a single self-contained HTML document: one marker per alert,
//! a severity legend and a small embedded tile viewer (drag to pan, zoom
//! buttons, click a marker for its popup). The tile server URL is the only
//! external reference.
//!
//! Rendering never fails; an empty alert list yields a map with zero markers.

use std::fmt::Write as _;

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use rand::Rng;
use serde::Serialize;

use crate::analyze::alert::{Alert, AlertType, Severity};
use crate::geocode::{GeoPoint, Geocoder};
use crate::locations::CAPITAL;

pub const DEFAULT_TILE_URL: &str = "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}.png";
pub const DEFAULT_ZOOM: u8 = 11;

pub fn severity_color(s: Severity) -> &'static str {
    match s {
        Severity::Faible => "green",
        Severity::Moyen => "orange",
        Severity::Eleve => "red",
    }
}

/// (icon name, glyph). `TENSION` doubles as the generic warning icon.
pub fn type_icon(t: AlertType) -> (&'static str, &'static str) {
    match t {
        AlertType::Manifestation => ("bullhorn", "\u{1F4E2}"),
        AlertType::Violence => ("exclamation-triangle", "\u{1F4A5}"),
        AlertType::Greve => ("users", "\u{1F465}"),
        AlertType::Tension => ("warning", "\u{26A0}"),
        AlertType::Blocage => ("ban", "\u{26D4}"),
        AlertType::Accident => ("car-crash", "\u{1F697}"),
    }
}

/// A positioned alert, ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub seq: usize,
    pub alert: Alert,
    pub point: GeoPoint,
}

#[derive(Debug, Clone)]
pub struct MapRenderer {
    geocoder: Geocoder,
    center: (f64, f64),
    zoom: u8,
    tile_url: String,
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self {
            geocoder: Geocoder::default(),
            center: (CAPITAL.lat, CAPITAL.lon),
            zoom: DEFAULT_ZOOM,
            tile_url: DEFAULT_TILE_URL.to_string(),
        }
    }
}

impl MapRenderer {
    pub fn new(geocoder: Geocoder) -> Self {
        Self {
            geocoder,
            ..Self::default()
        }
    }

    pub fn with_tile_url(mut self, url: &str) -> Self {
        self.tile_url = url.to_string();
        self
    }

    /// Geocode every alert; sequence numbers start at 1.
    pub fn place_markers<R: Rng>(&self, alerts: &[Alert], rng: &mut R) -> Vec<Marker> {
        alerts
            .iter()
            .enumerate()
            .map(|(i, a)| Marker {
                seq: i + 1,
                alert: a.clone(),
                point: self.geocoder.locate(&a.place, rng),
            })
            .collect()
    }

    pub fn render<R: Rng>(&self, alerts: &[Alert], rng: &mut R) -> String {
        let markers = self.place_markers(alerts, rng);
        self.render_markers(&markers)
    }

    pub fn render_markers(&self, markers: &[Marker]) -> String {
        let mut body = String::new();
        for m in markers {
            write_marker(&mut body, m);
        }

        let mut out = String::with_capacity(8 * 1024 + body.len());
        let _ = write!(
            out,
            r#"<!DOCTYPE html>
<html lang="fr">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Radar</title>
<style>{css}</style>
</head>
<body>
<div id="radar-map" data-lat="{lat:.6}" data-lon="{lon:.6}" data-zoom="{zoom}" data-tiles="{tiles}">
<div class="radar-tiles"></div>
<div class="radar-markers">
{body}</div>
<div class="radar-zoom"><button type="button" data-dz="1">+</button><button type="button" data-dz="-1">&minus;</button></div>
</div>
{legend}
<script>{js}</script>
</body>
</html>
"#,
            css = CSS,
            lat = self.center.0,
            lon = self.center.1,
            zoom = self.zoom,
            tiles = attr(&self.tile_url),
            body = body,
            legend = legend_html(markers.len()),
            js = JS,
        );
        out
    }
}

/// Render with the built-in registry and a thread-local RNG for jitter.
pub fn render_map_html(alerts: &[Alert]) -> String {
    MapRenderer::default().render(alerts, &mut rand::rng())
}

/// Page served when no analysis has been generated yet.
pub fn render_placeholder_html() -> String {
    "<!DOCTYPE html>\n<html lang=\"fr\"><head><meta charset=\"utf-8\"><title>Radar</title></head>\
<body style=\"font-family:Arial,sans-serif;padding:24px\">\
<h2>Radar</h2>\
<p>The map is not available yet: no analysis has been generated.</p>\
<p>Trigger a refresh, then reload this page.</p>\
</body></html>\n"
        .to_string()
}

fn write_marker(out: &mut String, m: &Marker) {
    let a = &m.alert;
    let color = severity_color(a.severity);
    let (icon, glyph) = type_icon(a.kind);
    let provenance = m.point.matched.unwrap_or("approximate location");
    let tooltip = format!("{} - {} ({})", a.kind, a.place, a.severity);

    let _ = writeln!(
        out,
        r#"<div class="radar-marker" data-seq="{seq}" data-lat="{lat:.6}" data-lon="{lon:.6}" data-severity="{sev}" data-color="{color}" data-icon="{icon}" title="{tooltip}" style="background:{color}"><span class="radar-glyph">{glyph}</span><div class="radar-popup"><h4 style="color:{color};border-bottom:2px solid {color}">{kind}</h4><p><b>Place:</b> {place}</p><p><b>Severity:</b> <span style="color:{color};font-weight:bold">{sev}</span></p><p><b>Details:</b> {info}</p><p class="radar-prov">Alert #{seq} | {prov}</p></div></div>"#,
        seq = m.seq,
        lat = m.point.lat,
        lon = m.point.lon,
        sev = a.severity,
        color = color,
        icon = icon,
        tooltip = attr(&tooltip),
        glyph = glyph,
        kind = a.kind,
        place = text(&a.place),
        info = text(&a.info),
        prov = text(provenance),
    );
}

fn legend_html(count: usize) -> String {
    let mut rows = String::new();
    for (sev, label) in [
        (Severity::Faible, "Low (monitoring)"),
        (Severity::Moyen, "Medium (vigilance)"),
        (Severity::Eleve, "High (danger)"),
    ] {
        let _ = write!(
            rows,
            r#"<div class="radar-legend-row"><span style="color:{}">&#9679;</span> {} <small>{}</small></div>"#,
            severity_color(sev),
            label,
            sev,
        );
    }
    let noun = if count == 1 { "active alert" } else { "active alerts" };
    format!(
        r#"<div class="radar-legend"><h4>Alert level</h4>{rows}<hr><p class="radar-count">{count} {noun}</p></div>"#
    )
}

const CSS: &str = r#"
html,body{margin:0;height:100%;font-family:Arial,sans-serif}
#radar-map{position:relative;width:100%;height:100%;overflow:hidden;background:#e5e3df;cursor:grab}
.radar-tiles img{position:absolute;width:256px;height:256px;user-select:none;pointer-events:none}
.radar-marker{position:absolute;width:28px;height:28px;margin:-14px 0 0 -14px;border-radius:50%;border:2px solid #fff;box-shadow:0 1px 4px rgba(0,0,0,.4);text-align:center;line-height:28px;font-size:14px;cursor:pointer}
.radar-popup{display:none;position:absolute;bottom:34px;left:-110px;width:240px;padding:8px;background:#fff;border-radius:6px;box-shadow:0 2px 10px rgba(0,0,0,.3);text-align:left;line-height:1.3;font-size:13px;color:#222;z-index:10}
.radar-popup h4{margin:0 0 8px 0;font-size:16px}
.radar-popup p{margin:4px 0}
.radar-prov{font-size:11px;color:#666}
.radar-marker.open .radar-popup{display:block}
.radar-zoom{position:absolute;top:10px;left:10px;z-index:20}
.radar-zoom button{display:block;width:30px;height:30px;font-size:18px;margin-bottom:2px}
.radar-legend{position:fixed;bottom:60px;right:60px;z-index:1000;background:#fff;padding:18px;border:3px solid #2c3e50;border-radius:10px;box-shadow:0 4px 15px rgba(0,0,0,.3)}
.radar-legend h4{margin:0 0 12px 0;color:#2c3e50;font-size:16px}
.radar-legend-row{margin:6px 0}
.radar-legend-row span{font-size:20px}
.radar-count{margin:5px 0 0 0;font-size:11px;color:#666;text-align:center}
"#;

const JS: &str = r#"
(function () {
  var map = document.getElementById('radar-map');
  var tiles = map.querySelector('.radar-tiles');
  var markers = Array.prototype.slice.call(map.querySelectorAll('.radar-marker'));
  var tpl = map.getAttribute('data-tiles');
  var zoom = parseInt(map.getAttribute('data-zoom'), 10);
  var size = function (z) { return 256 * Math.pow(2, z); };
  var project = function (lat, lon, z) {
    var r = lat * Math.PI / 180, s = size(z);
    return { x: (lon + 180) / 360 * s, y: (1 - Math.log(Math.tan(r) + 1 / Math.cos(r)) / Math.PI) / 2 * s };
  };
  var unproject = function (p, z) {
    var s = size(z), n = Math.PI - 2 * Math.PI * p.y / s;
    return { lat: 180 / Math.PI * Math.atan(0.5 * (Math.exp(n) - Math.exp(-n))), lon: p.x / s * 360 - 180 };
  };
  var center = project(parseFloat(map.getAttribute('data-lat')), parseFloat(map.getAttribute('data-lon')), zoom);

  function draw() {
    var w = map.clientWidth, h = map.clientHeight, n = Math.pow(2, zoom);
    var ox = center.x - w / 2, oy = center.y - h / 2;
    tiles.innerHTML = '';
    for (var tx = Math.floor(ox / 256); tx <= Math.floor((ox + w) / 256); tx++) {
      for (var ty = Math.floor(oy / 256); ty <= Math.floor((oy + h) / 256); ty++) {
        if (ty < 0 || ty >= n) continue;
        var wx = ((tx % n) + n) % n;
        var img = document.createElement('img');
        img.src = tpl.replace('{s}', 'abc'.charAt((wx + ty) % 3)).replace('{z}', zoom).replace('{x}', wx).replace('{y}', ty);
        img.style.left = (tx * 256 - ox) + 'px';
        img.style.top = (ty * 256 - oy) + 'px';
        tiles.appendChild(img);
      }
    }
    markers.forEach(function (m) {
      var p = project(parseFloat(m.getAttribute('data-lat')), parseFloat(m.getAttribute('data-lon')), zoom);
      m.style.left = (p.x - ox) + 'px';
      m.style.top = (p.y - oy) + 'px';
    });
  }

  var drag = null;
  map.addEventListener('mousedown', function (e) { drag = { x: e.clientX, y: e.clientY }; map.style.cursor = 'grabbing'; });
  window.addEventListener('mouseup', function () { drag = null; map.style.cursor = ''; });
  window.addEventListener('mousemove', function (e) {
    if (!drag) return;
    center = { x: center.x - (e.clientX - drag.x), y: center.y - (e.clientY - drag.y) };
    drag = { x: e.clientX, y: e.clientY };
    draw();
  });
  map.querySelectorAll('.radar-zoom button').forEach(function (b) {
    b.addEventListener('mousedown', function (e) { e.stopPropagation(); });
    b.addEventListener('click', function () {
      var z = Math.max(3, Math.min(18, zoom + parseInt(b.getAttribute('data-dz'), 10)));
      var ll = unproject(center, zoom);
      zoom = z;
      center = project(ll.lat, ll.lon, zoom);
      draw();
    });
  });
  markers.forEach(function (m) {
    m.addEventListener('mousedown', function (e) { e.stopPropagation(); });
    m.addEventListener('click', function () {
      var open = m.classList.contains('open');
      markers.forEach(function (o) { o.classList.remove('open'); });
      if (!open) m.classList.add('open');
    });
  });
  window.addEventListener('resize', draw);
  draw();
})();
"#;
