// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Waybar weather widget.
//!
//! Produce a waybar-consumable JSON payload describing current conditions
//! and the upcoming forecast. The bar shows a compact `icon + temperature`
//! text, and the tooltip carries pango-markup sections for current
//! conditions, today's outlook (including rain), tomorrow at key times, and
//! a multi-day summary.
//!
//! # Data Sources
//!
//! Location comes from the host's public IP (checkip.amazonaws.com, then
//! ip-api.com for geolocation), falling back to a null location when either
//! lookup fails. Forecast data comes from the Open-Meteo forecast API.
//!
//! # Failure Behavior
//!
//! The bar rerenders this payload on a timer, so a broken fetch must never
//! break the bar: any failure collapses into a placeholder payload with
//! `N/A` text, and the process still exits zero. Rendering is kept pure and
//! separate from fetching so it stays testable with canned data.

use chrono::{Days, Local, NaiveDate, NaiveDateTime, Timelike};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default number of upcoming days in the outlook section.
pub const DAYS_FORECAST: usize = 5;

const FG_HEADER: &str = "#f4b8e4";
const FG_TEXT: &str = "#ffffff";
const FALLBACK_LOCATION: &str = "Your Location";

const TEMP_COLORS: [(f64, &str); 9] = [
    (15.0, "#8caaee"),
    (18.0, "#85c1dc"),
    (21.0, "#99d1db"),
    (24.0, "#81c8be"),
    (27.0, "#a6d189"),
    (30.0, "#e5c890"),
    (32.0, "#ef9f76"),
    (33.0, "#ea999c"),
    (100.0, "#e78284"),
];

/// Icon and description for a WMO weather interpretation code.
pub fn weather_info(code: u32) -> (&'static str, &'static str) {
    match code {
        0 => ("☀️", "Clear sky"),
        1 => ("🌤️", "Mainly clear"),
        2 => ("⛅", "Partly cloudy"),
        3 => ("☁️", "Overcast"),
        45 => ("🌫️", "Fog"),
        48 => ("🌫️", "Depositing rime fog"),
        51 => ("🌦️", "Light drizzle"),
        53 => ("🌦️", "Moderate drizzle"),
        55 => ("🌦️", "Dense drizzle"),
        61 => ("🌧️", "Slight rain"),
        63 => ("🌧️", "Moderate rain"),
        65 => ("🌧️", "Heavy rain"),
        66 => ("🌧️", "Light freezing rain"),
        67 => ("🌧️", "Heavy freezing rain"),
        71 => ("❄️", "Slight snow"),
        73 => ("❄️", "Moderate snow"),
        75 => ("❄️", "Heavy snow"),
        80 => ("🌦️", "Slight rain showers"),
        81 => ("🌧️", "Moderate rain showers"),
        82 => ("🌧️", "Violent rain showers"),
        95 => ("⛈️", "Thunderstorm"),
        96 => ("⛈️", "Thunderstorm with hail (slight)"),
        99 => ("⛈️", "Thunderstorm with hail (severe)"),
        _ => ("❓", "Unknown"),
    }
}

/// Shortened description that fits the narrow tooltip columns.
pub fn short_label(description: &str) -> &str {
    match description {
        "Slight rain showers" => "Slight rain",
        "Moderate rain showers" => "Moderate rain",
        "Violent rain showers" => "Heavy rain",
        "Thunderstorm with hail (slight)" => "Hail Storm",
        "Thunderstorm with hail (severe)" => "Severe Storm",
        "Light drizzle" => "Drizzle",
        "Moderate drizzle" => "Mod drizzle",
        "Moderate rain" => "Mod rain",
        "Light freezing rain" => "Freezing rain",
        "Heavy freezing rain" => "Heavy freeze",
        "Slight snow" => "Snow",
        "Moderate snow" => "Mod snow",
        "Clear sky" => "Clear",
        "Partly cloudy" => "Part cloudy",
        "Depositing rime fog" => "Rime fog",
        other => other,
    }
}

/// Color for a temperature on the cold-to-hot ramp.
pub fn temp_color(temp: f64) -> &'static str {
    for (t_max, color) in TEMP_COLORS {
        if temp <= t_max {
            return color;
        }
    }

    TEMP_COLORS[TEMP_COLORS.len() - 1].1
}

/// Payload consumed by waybar's custom module protocol.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WaybarPayload {
    pub text: String,
    pub tooltip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,
}

impl WaybarPayload {
    /// Placeholder payload shown when the forecast cannot be produced.
    pub fn unavailable(message: impl AsRef<str>) -> Self {
        Self {
            text: "N/A".into(),
            tooltip: format!(
                "<span foreground='{FG_HEADER}'>{}</span>",
                message.as_ref()
            ),
            markup: None,
        }
    }

    /// Serialize payload to the JSON line waybar reads.
    ///
    /// # Errors
    ///
    /// - Return [`serde_json::Error`] if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Open-Meteo forecast response.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Forecast {
    pub current_weather: CurrentWeather,
    pub hourly: Hourly,
    pub daily: Daily,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub weathercode: u32,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Hourly {
    pub time: Vec<String>,
    pub temperature_2m: Vec<f64>,
    pub weathercode: Vec<u32>,
    #[serde(default)]
    pub apparent_temperature: Vec<f64>,
    #[serde(default)]
    pub relativehumidity_2m: Vec<f64>,
    #[serde(default)]
    pub windspeed_10m: Vec<f64>,
    #[serde(default)]
    pub precipitation_probability: Vec<f64>,
    #[serde(default)]
    pub precipitation: Vec<f64>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Daily {
    pub time: Vec<String>,
    pub temperature_2m_max: Vec<f64>,
    pub temperature_2m_min: Vec<f64>,
    pub weathercode: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct GeoLookup {
    lat: f64,
    lon: f64,
    city: Option<String>,
}

/// Fetch the forecast and render the waybar payload.
///
/// # Errors
///
/// - Return [`Error::Http`] if the forecast endpoint cannot be reached or
///   its response cannot be decoded. Geolocation failures do not error;
///   they fall back to the null location.
pub async fn report(days: usize) -> Result<WaybarPayload> {
    let client = Client::new();
    let (lat, lon, location_name) = locate(&client).await;
    let forecast = fetch(&client, lat, lon).await?;
    let now = Local::now().naive_local();

    Ok(render(&forecast, now, days, &location_name))
}

async fn locate(client: &Client) -> (f64, f64, String) {
    match try_locate(client).await {
        Ok(located) => located,
        Err(error) => {
            debug!("geolocation failed, using null location: {error}");
            (0.0, 0.0, FALLBACK_LOCATION.to_string())
        }
    }
}

async fn try_locate(client: &Client) -> Result<(f64, f64, String)> {
    let ip = client
        .get("https://checkip.amazonaws.com")
        .timeout(Duration::from_secs(5))
        .send()
        .await?
        .text()
        .await?;

    let lookup: GeoLookup = client
        .get(format!("http://ip-api.com/json/{}", ip.trim()))
        .timeout(Duration::from_secs(5))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok((
        lookup.lat,
        lookup.lon,
        lookup.city.unwrap_or_else(|| FALLBACK_LOCATION.to_string()),
    ))
}

fn forecast_url(lat: f64, lon: f64) -> String {
    format!(
        "https://api.open-meteo.com/v1/forecast?\
         latitude={lat}&longitude={lon}\
         &current_weather=true\
         &hourly=temperature_2m,apparent_temperature,weathercode,\
         relativehumidity_2m,windspeed_10m,precipitation_probability,precipitation\
         &daily=temperature_2m_max,temperature_2m_min,weathercode,precipitation_sum\
         &timezone=auto"
    )
}

async fn fetch(client: &Client, lat: f64, lon: f64) -> Result<Forecast> {
    let forecast = client
        .get(forecast_url(lat, lon))
        .timeout(Duration::from_secs(10))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(forecast)
}

/// Render the waybar payload from forecast data.
///
/// Pure with respect to the clock: `now` is injected so rendering stays
/// testable with canned data.
pub fn render(forecast: &Forecast, now: NaiveDateTime, days: usize, location_name: &str) -> WaybarPayload {
    let current = extract_current(forecast, now);
    let tomorrow = now.date() + Days::new(1);

    let (icon, _) = weather_info(current.code);
    let text = format!(
        " | {icon} <span foreground='{}'>{}°C</span>",
        temp_color(current.temp),
        current.temp
    );

    let current_lines = build_current_section(&current);
    let mut today_lines = build_today_rain_info(&forecast.hourly, now);
    today_lines.extend(build_hourly_forecast(&forecast.hourly, now, now.date()));
    let tomorrow_lines = build_tomorrow_forecast(&forecast.hourly, tomorrow);
    let daily_lines = build_daily_forecast(&forecast.daily, days);

    let sections = [
        (current_lines, format!("🌍 Current Weather - {location_name}")),
        (today_lines, "☀️ Today Forecast:".to_string()),
        (tomorrow_lines, "⛅ Tomorrow Forecast:".to_string()),
        (daily_lines, format!("📅 Upcoming {days}-day Forecast:")),
    ];

    let max_len = sections
        .iter()
        .flat_map(|(lines, heading)| lines.iter().chain(std::iter::once(heading)))
        .map(|line| visible_length(line))
        .max()
        .unwrap_or(0);

    let tooltip = build_tooltip(&sections, max_len);

    WaybarPayload {
        text,
        tooltip,
        markup: Some("pango".into()),
    }
}

struct CurrentConditions {
    temp: f64,
    code: u32,
    feels_like: f64,
    humidity: f64,
    windspeed: f64,
}

fn parse_hour(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").ok()
}

fn at_or(values: &[f64], index: usize, fallback: f64) -> f64 {
    values.get(index).copied().unwrap_or(fallback)
}

fn find_current_hour_index(times: &[String], now: NaiveDateTime) -> usize {
    for (index, value) in times.iter().enumerate() {
        if let Some(dt) = parse_hour(value) {
            if dt.hour() == now.hour() && dt.date() == now.date() {
                return index;
            }
        }
    }

    0
}

fn extract_current(forecast: &Forecast, now: NaiveDateTime) -> CurrentConditions {
    let current = &forecast.current_weather;
    let hourly = &forecast.hourly;
    let index = find_current_hour_index(&hourly.time, now);

    CurrentConditions {
        temp: current.temperature,
        code: current.weathercode,
        feels_like: at_or(&hourly.apparent_temperature, index, current.temperature),
        humidity: at_or(&hourly.relativehumidity_2m, index, 0.0),
        windspeed: at_or(&hourly.windspeed_10m, index, 0.0),
    }
}

fn build_current_section(current: &CurrentConditions) -> Vec<String> {
    let (icon, description) = weather_info(current.code);

    vec![
        format!(
            "🌡️ <span foreground='{}'>{}°C</span> (Feels like <span foreground='{}'>{}°C</span>)",
            temp_color(current.temp),
            current.temp,
            temp_color(current.feels_like),
            current.feels_like
        ),
        format!("{icon} {description}"),
        format!("💧 Humidity: {}%", current.humidity),
        format!("🌬️ Wind Speed: {} km/h", current.windspeed),
    ]
}

fn build_today_rain_info(hourly: &Hourly, now: NaiveDateTime) -> Vec<String> {
    let mut rain_probs = Vec::new();
    let mut rain_start = None;
    let mut precip_total = 0.0;

    for (index, value) in hourly.time.iter().enumerate() {
        let Some(dt) = parse_hour(value) else {
            continue;
        };

        if dt.date() == now.date() && dt >= now {
            let prob = at_or(&hourly.precipitation_probability, index, 0.0);
            rain_probs.push(prob);
            precip_total += at_or(&hourly.precipitation, index, 0.0);
            if prob > 0.0 && rain_start.is_none() {
                rain_start = Some(dt);
            }
        }
    }

    let peak = rain_probs.iter().copied().fold(0.0, f64::max);
    if rain_probs.is_empty() || peak <= 0.0 {
        return Vec::new();
    }

    let mut lines = vec![format!(
        "🌧️ Chance of rain today: <span foreground='{FG_TEXT}'>{peak:.0}%</span>"
    )];
    match rain_start {
        Some(start) => lines.push(format!(
            "⏱️ Expected rain start: {}",
            start.format("%I:%M %p")
        )),
        None => lines.push("⏱️ Expected rain start: None predicted".to_string()),
    }
    lines.push(format!("☔ Total predicted rain: {precip_total:.1} mm"));
    lines.push(String::new());

    lines
}

fn build_hourly_forecast(hourly: &Hourly, now: NaiveDateTime, for_date: NaiveDate) -> Vec<String> {
    let mut lines = Vec::new();

    for (index, value) in hourly.time.iter().enumerate() {
        let Some(dt) = parse_hour(value) else {
            continue;
        };

        if dt.date() != for_date || (for_date == now.date() && dt < now) {
            continue;
        }

        let temp = at_or(&hourly.temperature_2m, index, 0.0);
        let code = hourly.weathercode.get(index).copied().unwrap_or(0);
        let (icon, description) = weather_info(code);
        lines.push(format!(
            "{} - <span foreground='{}'>{:>2}°C</span> {icon} {}",
            dt.format("%H:%M"),
            temp_color(temp),
            temp,
            short_label(description)
        ));
    }

    if lines.is_empty() {
        return vec!["Hourly forecast unavailable".to_string()];
    }

    lines
}

fn build_tomorrow_forecast(hourly: &Hourly, tomorrow: NaiveDate) -> Vec<String> {
    const TIME_LABELS: [(u32, &str); 4] = [
        (6, "Morning"),
        (12, "Midday"),
        (15, "Afternoon"),
        (18, "Evening"),
    ];
    let label_width = TIME_LABELS
        .iter()
        .map(|(_, label)| label.len())
        .max()
        .unwrap_or(0);

    let mut lines = Vec::new();
    for (index, value) in hourly.time.iter().enumerate() {
        let Some(dt) = parse_hour(value) else {
            continue;
        };

        if dt.date() != tomorrow {
            continue;
        }

        let Some((_, label)) = TIME_LABELS.iter().find(|(hour, _)| *hour == dt.hour()) else {
            continue;
        };

        let temp = at_or(&hourly.temperature_2m, index, 0.0);
        let code = hourly.weathercode.get(index).copied().unwrap_or(0);
        let (icon, description) = weather_info(code);
        lines.push(format!(
            "{label:<label_width$} - <span foreground='{}'>{:>2}°C</span> {icon} {}",
            temp_color(temp),
            temp,
            short_label(description)
        ));
    }

    if lines.is_empty() {
        return vec!["Tomorrow forecast unavailable".to_string()];
    }

    lines
}

fn build_daily_forecast(daily: &Daily, days: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let count = daily.time.len().min(days + 1);

    for index in 1..count {
        let Some(date) = NaiveDate::parse_from_str(&daily.time[index], "%Y-%m-%d").ok() else {
            continue;
        };

        let max_temp = at_or(&daily.temperature_2m_max, index, 0.0);
        let min_temp = at_or(&daily.temperature_2m_min, index, 0.0);
        let code = daily.weathercode.get(index).copied().unwrap_or(0);
        let (icon, description) = weather_info(code);
        lines.push(format!(
            "{:<3} ⬆️<span foreground='{}'>{:>2}°C</span> ⬇️<span foreground='{}'>{:>2}°C</span> {icon} {}",
            date.format("%a").to_string(),
            temp_color(max_temp),
            max_temp,
            temp_color(min_temp),
            min_temp,
            short_label(description)
        ));
    }

    lines
}

/// Length of a line with pango markup tags stripped.
fn visible_length(line: &str) -> usize {
    let tags = Regex::new(r"<[^>]*>").unwrap();
    tags.replace_all(line, "").chars().count()
}

fn render_section(lines: &[String], heading: &str, max_len: usize) -> Vec<String> {
    let mut section = vec![
        format!("<span foreground='{FG_HEADER}' font='9'>{heading}</span>"),
        format!("<span foreground='{FG_TEXT}'>{}</span>", "─".repeat(max_len)),
    ];
    section.extend(
        lines
            .iter()
            .map(|line| format!("<span foreground='{FG_TEXT}' font='9'>{line}</span>")),
    );
    section.push(String::new());

    section
}

fn build_tooltip(sections: &[(Vec<String>, String)], max_len: usize) -> String {
    let mut tooltip_lines = Vec::new();
    for (lines, heading) in sections {
        tooltip_lines.extend(render_section(lines, heading, max_len));
    }

    tooltip_lines.join("\n")
}

/// Forecast error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Forecast endpoint cannot be reached or decoded.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test_case(0, "☀️", "Clear sky"; "clear sky")]
    #[test_case(55, "🌦️", "Dense drizzle"; "dense drizzle")]
    #[test_case(99, "⛈️", "Thunderstorm with hail (severe)"; "severe hail")]
    #[test_case(42, "❓", "Unknown"; "unknown code")]
    #[test]
    fn weather_codes_map_to_icons(code: u32, icon: &str, description: &str) {
        pretty_assertions::assert_eq!(weather_info(code), (icon, description));
    }

    #[test_case(-5.0, "#8caaee"; "below first threshold")]
    #[test_case(15.0, "#8caaee"; "at first threshold")]
    #[test_case(15.1, "#85c1dc"; "just past first threshold")]
    #[test_case(31.0, "#ea999c"; "hot")]
    #[test_case(120.0, "#e78284"; "beyond ramp")]
    #[test]
    fn temperature_ramp_boundaries(temp: f64, expect: &str) {
        pretty_assertions::assert_eq!(temp_color(temp), expect);
    }

    #[test]
    fn short_labels_fit_columns() {
        assert_eq!(short_label("Violent rain showers"), "Heavy rain");
        assert_eq!(short_label("Clear sky"), "Clear");
        assert_eq!(short_label("Fog"), "Fog");
    }

    #[test]
    fn markup_is_invisible_to_length() {
        let line = "<span foreground='#ffffff'>21°C</span> ☀️ Clear";
        assert_eq!(visible_length(line), "21°C ☀️ Clear".chars().count());
    }

    #[test]
    fn unavailable_payload_has_no_markup_flag() {
        let payload = WaybarPayload::unavailable("Weather unavailable");
        let json = payload.to_json().unwrap();

        assert!(json.contains("\"text\":\"N/A\""));
        assert!(!json.contains("markup"));
    }

    #[test]
    fn deserialize_open_meteo_response() -> anyhow::Result<()> {
        let data = indoc! {r#"
            {
              "current_weather": {"temperature": 21.4, "weathercode": 2, "windspeed": 7.9},
              "hourly": {
                "time": ["2026-08-07T13:00", "2026-08-07T14:00"],
                "temperature_2m": [21.4, 22.0],
                "weathercode": [2, 3],
                "apparent_temperature": [20.9, 21.6],
                "relativehumidity_2m": [56, 54],
                "windspeed_10m": [7.9, 8.4],
                "precipitation_probability": [10, 35],
                "precipitation": [0.0, 0.2]
              },
              "daily": {
                "time": ["2026-08-07", "2026-08-08"],
                "temperature_2m_max": [24.1, 25.0],
                "temperature_2m_min": [14.2, 15.1],
                "weathercode": [2, 61]
              }
            }
        "#};

        let forecast: Forecast = serde_json::from_str(data)?;
        assert_eq!(forecast.current_weather.weathercode, 2);
        assert_eq!(forecast.hourly.time.len(), 2);
        assert_eq!(forecast.daily.temperature_2m_max, vec![24.1, 25.0]);

        Ok(())
    }

    fn canned_forecast() -> Forecast {
        Forecast {
            current_weather: CurrentWeather {
                temperature: 21.4,
                weathercode: 2,
            },
            hourly: Hourly {
                time: vec![
                    "2026-08-07T13:00".into(),
                    "2026-08-07T14:00".into(),
                    "2026-08-08T06:00".into(),
                    "2026-08-08T12:00".into(),
                ],
                temperature_2m: vec![21.4, 22.0, 16.3, 23.8],
                weathercode: vec![2, 3, 0, 61],
                apparent_temperature: vec![20.9, 21.6, 15.8, 23.0],
                relativehumidity_2m: vec![56.0, 54.0, 70.0, 48.0],
                windspeed_10m: vec![7.9, 8.4, 4.2, 9.1],
                precipitation_probability: vec![10.0, 35.0, 0.0, 60.0],
                precipitation: vec![0.0, 0.2, 0.0, 1.4],
            },
            daily: Daily {
                time: vec![
                    "2026-08-07".into(),
                    "2026-08-08".into(),
                    "2026-08-09".into(),
                ],
                temperature_2m_max: vec![24.1, 25.0, 19.7],
                temperature_2m_min: vec![14.2, 15.1, 11.0],
                weathercode: vec![2, 61, 0],
            },
        }
    }

    #[test]
    fn render_builds_waybar_payload() {
        let now = NaiveDate::from_ymd_opt(2026, 8, 7)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap();
        let payload = render(&canned_forecast(), now, 5, "Tokyo");

        assert!(payload.text.contains("⛅"));
        assert!(payload.text.contains("21.4°C"));
        assert_eq!(payload.markup.as_deref(), Some("pango"));
        assert!(payload.tooltip.contains("🌍 Current Weather - Tokyo"));
        assert!(payload.tooltip.contains("☀️ Today Forecast:"));
        assert!(payload.tooltip.contains("⛅ Tomorrow Forecast:"));
        assert!(payload.tooltip.contains("📅 Upcoming 5-day Forecast:"));
        assert!(payload.tooltip.contains("🌧️ Chance of rain today:"));
    }

    #[test]
    fn tomorrow_section_uses_key_times() {
        let now = NaiveDate::from_ymd_opt(2026, 8, 7)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap();
        let forecast = canned_forecast();
        let lines = build_tomorrow_forecast(&forecast.hourly, now.date() + Days::new(1));

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Morning"));
        assert!(lines[1].starts_with("Midday"));
    }

    #[test]
    fn daily_section_skips_today() {
        let lines = build_daily_forecast(&canned_forecast().daily, 5);

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Sat"));
        assert!(lines[1].starts_with("Sun"));
    }
}
