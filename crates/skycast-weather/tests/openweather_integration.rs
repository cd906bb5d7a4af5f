//! Integration tests for OpenWeatherClient using wiremock.

use skycast_weather::{
    GroupError, OpenWeatherClient, OpenWeatherConfig, TemperatureUnit, WeatherError,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, units: TemperatureUnit) -> OpenWeatherClient {
    let mut config = OpenWeatherConfig::new("test_key");
    config.geocoding_url = format!("{}/geo/1.0/direct", server.uri());
    config.forecast_url = format!("{}/data/2.5/forecast", server.uri());
    config.units = units;
    OpenWeatherClient::new(config).unwrap()
}

fn entry(dt_txt: serde_json::Value, temp_min: f64) -> serde_json::Value {
    serde_json::json!({
        "dt": 1704078000,
        "main": {
            "temp": temp_min + 1.0,
            "temp_min": temp_min,
            "temp_max": temp_min + 2.0,
            "pressure": 1016,
            "humidity": 64
        },
        "weather": [{"id": 800, "main": "Clear"}],
        "dt_txt": dt_txt
    })
}

async fn mount_pune_geocode(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "Pune"))
        .and(query_param("appid", "test_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"name": "Pune", "lat": 18.5204, "lon": 73.8567, "country": "IN", "state": "Maharashtra"}
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_geocode_returns_first_match() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "Springfield"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"name": "Springfield", "lat": 39.78, "lon": -89.65, "country": "US", "state": "Illinois"},
            {"name": "Springfield", "lat": 37.21, "lon": -93.29, "country": "US", "state": "Missouri"}
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server, TemperatureUnit::Standard);
    let location = client.geocode("  Springfield ").await.unwrap();

    assert_eq!(location.state.as_deref(), Some("Illinois"));
    assert_eq!(location.display_name(), "Springfield, Illinois, US");
}

#[tokio::test]
async fn test_geocode_empty_result_is_city_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server, TemperatureUnit::Standard);
    let err = client.geocode("Atlantis").await.unwrap_err();

    assert!(matches!(err, WeatherError::CityNotFound(ref q) if q == "Atlantis"));
    assert_eq!(
        err.user_message(),
        "City not found. Please check the name and try again."
    );
}

#[tokio::test]
async fn test_geocode_404_is_city_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "cod": "404", "message": "city not found"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, TemperatureUnit::Standard);
    let err = client.geocode("Nowhere").await.unwrap_err();

    assert!(matches!(err, WeatherError::CityNotFound(_)));
}

#[tokio::test]
async fn test_unauthorized_is_invalid_api_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "cod": 401, "message": "Invalid API key"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, TemperatureUnit::Standard);
    let err = client.geocode("Pune").await.unwrap_err();

    assert!(matches!(err, WeatherError::InvalidApiKey));
}

#[tokio::test]
async fn test_server_error_is_api_error() {
    let server = MockServer::start().await;
    mount_pune_geocode(&server).await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = client_for(&server, TemperatureUnit::Standard);
    let err = client.search("Pune").await.unwrap_err();

    match err {
        WeatherError::Api { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "bad gateway");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_search_groups_forecast_by_day() {
    let server = MockServer::start().await;
    mount_pune_geocode(&server).await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("lat", "18.5204"))
        .and(query_param("lon", "73.8567"))
        .and(query_param("appid", "test_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cod": "200",
            "cnt": 4,
            "list": [
                entry("2024-01-01 03:00:00".into(), 290.0),
                entry("2024-01-01 06:00:00".into(), 295.0),
                entry("2024-01-02 03:00:00".into(), 289.0),
                entry("2024-01-02 06:00:00".into(), 293.0)
            ],
            "city": {"name": "Pune", "country": "IN", "timezone": 19800}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, TemperatureUnit::Standard);
    let forecast = client.search("Pune").await.unwrap();

    assert_eq!(forecast.location.name, "Pune");
    assert_eq!(forecast.unit, TemperatureUnit::Standard);
    assert_eq!(forecast.days.len(), 2);
    assert_eq!(forecast.days[0].dt_txt.as_deref(), Some("2024-01-01 03:00:00"));
    assert_eq!(forecast.days[0].main.temp_min.as_f64(), Some(290.0));
    assert_eq!(forecast.days[1].dt_txt.as_deref(), Some("2024-01-02 03:00:00"));
    assert!(forecast.days[1].extra.contains_key("weather"));
}

#[tokio::test]
async fn test_metric_units_are_requested() {
    let server = MockServer::start().await;
    mount_pune_geocode(&server).await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "list": [entry("2024-01-01 03:00:00".into(), 17.0)]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, TemperatureUnit::Metric);
    let forecast = client.search("Pune").await.unwrap();

    assert_eq!(forecast.unit, TemperatureUnit::Metric);
    assert_eq!(forecast.days.len(), 1);
}

#[tokio::test]
async fn test_null_timestamp_fails_search() {
    let server = MockServer::start().await;
    mount_pune_geocode(&server).await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "list": [
                entry("2024-01-01 03:00:00".into(), 290.0),
                entry(serde_json::Value::Null, 291.0)
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, TemperatureUnit::Standard);
    let err = client.search("Pune").await.unwrap_err();

    assert!(matches!(
        err,
        WeatherError::Grouping(GroupError::MalformedSample { index: 1, .. })
    ));
    assert_eq!(
        err.user_message(),
        "Failed to fetch weather data. Please try again."
    );
}

#[tokio::test]
async fn test_unexpected_body_is_parse_error() {
    let server = MockServer::start().await;
    mount_pune_geocode(&server).await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "no list here"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, TemperatureUnit::Standard);
    let err = client.search("Pune").await.unwrap_err();

    assert!(matches!(err, WeatherError::Parse(_)));
}
