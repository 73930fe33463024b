//! Integration tests for the dashboard workflow: searches, history
//! recording, last-reading persistence and startup behaviour.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use skycast_core::{
    CITY_NOT_FOUND, Dashboard, DEFAULT_CITY, FetchError, KeyValueStore, LookupFailure,
    MemoryStore, ReadingView, SearchOutcome, TimeLocale, WeatherClient, WeatherCondition,
    WeatherProvider, WeatherReading,
    storage::{HISTORY_KEY, LAST_WEATHER_KEY},
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn reading(city: &str) -> WeatherReading {
    WeatherReading {
        city_name: city.to_string(),
        country_code: Some("ID".to_string()),
        temperature_celsius: Some(28.0),
        condition: Some(WeatherCondition::Rain),
        humidity_percent: Some(80),
        wind_speed_meters_per_second: Some(1.5),
        sunrise_epoch_seconds: Some(1_700_000_000),
        sunset_epoch_seconds: Some(1_700_030_000),
    }
}

/// Provider answering from a fixed table. Unknown cities fail with a 404.
#[derive(Debug, Default)]
struct StubProvider {
    known: HashMap<String, WeatherReading>,
    delays: HashMap<String, Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StubProvider {
    fn knowing(cities: &[&str]) -> Self {
        Self {
            known: cities.iter().map(|c| (c.to_string(), reading(c))).collect(),
            ..Self::default()
        }
    }

    fn delayed(mut self, city: &str, delay: Duration) -> Self {
        self.delays.insert(city.to_string(), delay);
        self
    }

    fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl WeatherProvider for StubProvider {
    async fn fetch_weather(&self, city: &str) -> Result<WeatherReading, FetchError> {
        self.calls.lock().push(city.to_string());

        if let Some(delay) = self.delays.get(city) {
            tokio::time::sleep(*delay).await;
        }

        self.known.get(city).cloned().ok_or_else(|| {
            FetchError::NotFound(LookupFailure::Status {
                status: StatusCode::NOT_FOUND,
                body: "city not found".to_string(),
            })
        })
    }
}

fn new_dashboard(provider: StubProvider, store: &Arc<MemoryStore>) -> Dashboard {
    Dashboard::new(Box::new(provider), store.clone())
}

fn history_of(dashboard: &Dashboard) -> Vec<String> {
    dashboard.snapshot().history.entries().to_vec()
}

#[tokio::test]
async fn search_jakarta_against_provider_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "Jakarta"))
        .and(query_param("units", "metric"))
        .and(query_param("appid", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Jakarta",
            "sys": { "country": "ID", "sunrise": 1700000000, "sunset": 1700030000 },
            "main": { "temp": 31.2, "humidity": 70 },
            "wind": { "speed": 2.1 },
            "weather": [ { "main": "Clouds" } ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let client = WeatherClient::with_base_url("test-key".to_string(), &mock_server.uri());
    let dashboard = Dashboard::new(Box::new(client), store.clone());

    assert_eq!(dashboard.search("Jakarta").await, SearchOutcome::Updated);

    let state = dashboard.snapshot();
    let reading = state.reading.expect("reading shown");
    let temp = reading.temperature_celsius.expect("temperature present");
    assert!((temp - 31.2).abs() < 1e-9);
    assert_eq!(reading.condition, Some(WeatherCondition::Clouds));
    assert!(state.error.is_none());
    assert_eq!(state.history.entries(), ["Jakarta"]);

    let view = ReadingView::new(&reading, &TimeLocale::system());
    assert_eq!(view.temperature, "31°C");
    assert_eq!(view.icon, "☁️");
    assert_eq!(view.location, "Jakarta, ID");

    let stored: WeatherReading =
        serde_json::from_str(&store.get(LAST_WEATHER_KEY).expect("persisted")).unwrap();
    assert_eq!(stored, reading);
    assert_eq!(store.get(HISTORY_KEY).as_deref(), Some(r#"["Jakarta"]"#));
}

#[tokio::test]
async fn provider_404_leaves_state_untouched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "Atlantis"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "cod": "404",
            "message": "city not found"
        })))
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryStore::new());
    store.set(HISTORY_KEY, r#"["Medan","Bandung"]"#).unwrap();
    store
        .set(LAST_WEATHER_KEY, &serde_json::to_string(&reading("Medan")).unwrap())
        .unwrap();

    let client = WeatherClient::with_base_url("k".to_string(), &mock_server.uri());
    let dashboard = Dashboard::new(Box::new(client), store.clone());
    let before = dashboard.snapshot();

    assert_eq!(dashboard.search("Atlantis").await, SearchOutcome::Failed);

    let after = dashboard.snapshot();
    assert_eq!(after.error.as_deref(), Some(CITY_NOT_FOUND));
    assert_eq!(after.reading, before.reading);
    assert_eq!(after.history, before.history);

    assert_eq!(store.get(HISTORY_KEY).as_deref(), Some(r#"["Medan","Bandung"]"#));
    let stored: WeatherReading =
        serde_json::from_str(&store.get(LAST_WEATHER_KEY).unwrap()).unwrap();
    assert_eq!(stored, reading("Medan"));
}

#[tokio::test]
async fn blank_search_does_nothing() {
    let store = Arc::new(MemoryStore::new());
    let provider = StubProvider::knowing(&["Jakarta"]);
    let calls = provider.calls();
    let dashboard = new_dashboard(provider, &store);
    let before = dashboard.snapshot();

    for input in ["", "   ", "\t\n"] {
        assert_eq!(dashboard.search(input).await, SearchOutcome::Skipped);
    }

    assert!(calls.lock().is_empty());
    assert_eq!(dashboard.snapshot(), before);
    assert!(store.is_empty());
}

#[tokio::test]
async fn startup_without_cache_fetches_default_city_once() {
    let store = Arc::new(MemoryStore::new());
    let provider = StubProvider::knowing(&[DEFAULT_CITY]);
    let calls = provider.calls();
    let dashboard = new_dashboard(provider, &store);

    assert_eq!(dashboard.startup().await, Some(SearchOutcome::Updated));

    assert_eq!(*calls.lock(), vec![DEFAULT_CITY.to_string()]);
    let state = dashboard.snapshot();
    assert_eq!(state.reading.map(|r| r.city_name), Some(DEFAULT_CITY.to_string()));
    assert!(state.history.is_empty());
    assert_eq!(store.get(HISTORY_KEY), None);
    assert!(store.get(LAST_WEATHER_KEY).is_some());
}

#[tokio::test]
async fn startup_with_cached_reading_skips_fetch() {
    let store = Arc::new(MemoryStore::new());
    store
        .set(LAST_WEATHER_KEY, &serde_json::to_string(&reading("Surabaya")).unwrap())
        .unwrap();

    let provider = StubProvider::knowing(&[DEFAULT_CITY]);
    let calls = provider.calls();
    let dashboard = new_dashboard(provider, &store);

    assert_eq!(dashboard.startup().await, None);
    assert!(calls.lock().is_empty());
    assert_eq!(
        dashboard.snapshot().reading.map(|r| r.city_name),
        Some("Surabaya".to_string())
    );
}

#[tokio::test]
async fn startup_ignores_cached_reading_without_city_name() {
    let store = Arc::new(MemoryStore::new());
    store.set(LAST_WEATHER_KEY, r#"{"cityName":""}"#).unwrap();

    let provider = StubProvider::knowing(&[DEFAULT_CITY]);
    let calls = provider.calls();
    let dashboard = new_dashboard(provider, &store);
    assert!(dashboard.snapshot().reading.is_none());

    assert_eq!(dashboard.startup().await, Some(SearchOutcome::Updated));
    assert_eq!(*calls.lock(), vec![DEFAULT_CITY.to_string()]);
    assert_eq!(
        dashboard.snapshot().reading.map(|r| r.city_name),
        Some(DEFAULT_CITY.to_string())
    );
}

#[tokio::test]
async fn startup_failure_shows_error_without_persisting() {
    let store = Arc::new(MemoryStore::new());
    let provider = StubProvider::knowing(&[]);
    let calls = provider.calls();
    let dashboard = new_dashboard(provider, &store);

    assert_eq!(dashboard.startup().await, Some(SearchOutcome::Failed));

    assert_eq!(*calls.lock(), vec![DEFAULT_CITY.to_string()]);
    let state = dashboard.snapshot();
    assert_eq!(state.error.as_deref(), Some(CITY_NOT_FOUND));
    assert!(state.reading.is_none());
    assert!(state.history.is_empty());
    assert_eq!(store.get(LAST_WEATHER_KEY), None);
    assert_eq!(store.get(HISTORY_KEY), None);
}

#[tokio::test]
async fn corrupt_storage_starts_empty() {
    let store = Arc::new(MemoryStore::new());
    store.set(HISTORY_KEY, "[1, 2").unwrap();
    store.set(LAST_WEATHER_KEY, "{}").unwrap();

    let provider = StubProvider::knowing(&[DEFAULT_CITY]);
    let calls = provider.calls();
    let dashboard = new_dashboard(provider, &store);

    let state = dashboard.snapshot();
    assert!(state.reading.is_none());
    assert!(state.history.is_empty());

    assert_eq!(dashboard.startup().await, Some(SearchOutcome::Updated));
    assert_eq!(calls.lock().len(), 1);
}

#[tokio::test]
async fn history_is_bounded_and_deduplicated() {
    let store = Arc::new(MemoryStore::new());
    let dashboard = new_dashboard(StubProvider::knowing(&["A", "B", "C", "D", "E", "F"]), &store);

    for city in ["A", "B", "C", "B", "D", "E", "F"] {
        assert_eq!(dashboard.search(city).await, SearchOutcome::Updated);
    }

    assert_eq!(history_of(&dashboard), ["F", "E", "D", "C", "B"]);
}

#[tokio::test]
async fn failed_search_is_not_recorded() {
    let store = Arc::new(MemoryStore::new());
    let dashboard = new_dashboard(StubProvider::knowing(&["Jakarta"]), &store);

    dashboard.search("Jakarta").await;
    assert_eq!(dashboard.search("Atlantis").await, SearchOutcome::Failed);

    assert_eq!(history_of(&dashboard), ["Jakarta"]);
    assert_eq!(
        dashboard.snapshot().reading.map(|r| r.city_name),
        Some("Jakarta".to_string())
    );
}

#[tokio::test]
async fn next_success_clears_error() {
    let store = Arc::new(MemoryStore::new());
    let dashboard = new_dashboard(StubProvider::knowing(&["Jakarta"]), &store);

    dashboard.search("Atlantis").await;
    assert_eq!(dashboard.snapshot().error.as_deref(), Some(CITY_NOT_FOUND));

    dashboard.search("Jakarta").await;
    assert!(dashboard.snapshot().error.is_none());
}

#[tokio::test]
async fn query_is_recorded_as_typed() {
    let store = Arc::new(MemoryStore::new());
    let dashboard = new_dashboard(StubProvider::knowing(&["jakarta"]), &store);

    assert_eq!(dashboard.search("jakarta").await, SearchOutcome::Updated);
    assert_eq!(history_of(&dashboard), ["jakarta"]);
}

#[tokio::test]
async fn selecting_from_history_keeps_order() {
    let store = Arc::new(MemoryStore::new());
    let dashboard = new_dashboard(StubProvider::knowing(&["A", "B", "C"]), &store);

    for city in ["A", "B", "C"] {
        dashboard.search(city).await;
    }
    assert_eq!(history_of(&dashboard), ["C", "B", "A"]);

    assert_eq!(dashboard.select_from_history("A").await, SearchOutcome::Updated);

    assert_eq!(history_of(&dashboard), ["C", "B", "A"]);
    assert_eq!(dashboard.snapshot().reading.map(|r| r.city_name), Some("A".to_string()));
}

#[tokio::test]
async fn state_survives_restart() {
    let store = Arc::new(MemoryStore::new());
    {
        let dashboard = new_dashboard(StubProvider::knowing(&["Medan", "Bandung"]), &store);
        dashboard.search("Medan").await;
        dashboard.search("Bandung").await;
    }

    let provider = StubProvider::default();
    let calls = provider.calls();
    let restarted = new_dashboard(provider, &store);

    let state = restarted.snapshot();
    assert_eq!(state.history.entries(), ["Bandung", "Medan"]);
    assert_eq!(state.reading.map(|r| r.city_name), Some("Bandung".to_string()));
    assert_eq!(restarted.startup().await, None);
    assert!(calls.lock().is_empty());
}

#[tokio::test]
async fn stale_completion_is_discarded() {
    let store = Arc::new(MemoryStore::new());
    let provider =
        StubProvider::knowing(&["Slow", "Fast"]).delayed("Slow", Duration::from_millis(100));
    let dashboard = new_dashboard(provider, &store);

    let (slow, fast) = tokio::join!(dashboard.search("Slow"), dashboard.search("Fast"));

    assert_eq!(fast, SearchOutcome::Updated);
    assert_eq!(slow, SearchOutcome::Stale);

    let state = dashboard.snapshot();
    assert_eq!(state.reading.map(|r| r.city_name), Some("Fast".to_string()));
    assert_eq!(state.history.entries(), ["Fast"]);

    let stored: WeatherReading =
        serde_json::from_str(&store.get(LAST_WEATHER_KEY).unwrap()).unwrap();
    assert_eq!(stored.city_name, "Fast");
    assert_eq!(store.get(HISTORY_KEY).as_deref(), Some(r#"["Fast"]"#));
}

#[tokio::test]
async fn stale_failure_does_not_show_error() {
    let store = Arc::new(MemoryStore::new());
    let provider =
        StubProvider::knowing(&["Fast"]).delayed("Atlantis", Duration::from_millis(100));
    let dashboard = new_dashboard(provider, &store);

    let (slow, fast) = tokio::join!(dashboard.search("Atlantis"), dashboard.search("Fast"));

    assert_eq!(fast, SearchOutcome::Updated);
    assert_eq!(slow, SearchOutcome::Stale);
    assert!(dashboard.snapshot().error.is_none());
}

#[tokio::test]
async fn in_order_completions_both_apply() {
    let store = Arc::new(MemoryStore::new());
    let provider =
        StubProvider::knowing(&["First", "Second"]).delayed("Second", Duration::from_millis(50));
    let dashboard = new_dashboard(provider, &store);

    let (first, second) = tokio::join!(dashboard.search("First"), dashboard.search("Second"));

    assert_eq!(first, SearchOutcome::Updated);
    assert_eq!(second, SearchOutcome::Updated);
    assert_eq!(
        dashboard.snapshot().reading.map(|r| r.city_name),
        Some("Second".to_string())
    );

    let stored: WeatherReading =
        serde_json::from_str(&store.get(LAST_WEATHER_KEY).unwrap()).unwrap();
    assert_eq!(stored.city_name, "Second");
    assert_eq!(store.get(HISTORY_KEY).as_deref(), Some(r#"["Second","First"]"#));
}

#[tokio::test]
async fn subscribers_see_applied_changes() {
    let store = Arc::new(MemoryStore::new());
    let dashboard = new_dashboard(StubProvider::knowing(&["Jakarta"]), &store);
    let mut rx = dashboard.subscribe();

    dashboard.search("Jakarta").await;

    assert!(rx.has_changed().unwrap());
    let seen = rx.borrow_and_update().clone();
    assert_eq!(seen.reading.map(|r| r.city_name), Some("Jakarta".to_string()));
    assert_eq!(seen.history.entries(), ["Jakarta"]);

    dashboard.search("").await;
    assert!(!rx.has_changed().unwrap());
}
