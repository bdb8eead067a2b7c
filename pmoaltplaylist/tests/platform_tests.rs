//! Integration tests for the streaming platform client

use pmoaltplaylist::{AltPlaylistError, MetadataGateway, PlatformClient};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Create a mock track JSON object
fn mock_track_json(id: &str, name: &str, artist: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "uri": format!("spotify:track:{}", id),
        "artists": [{"name": artist}],
        "album": {
            "name": format!("{} (album)", name),
            "images": [
                {"url": format!("https://img.example.com/{}-64.jpg", id), "width": 64},
                {"url": format!("https://img.example.com/{}-640.jpg", id), "width": 640}
            ]
        }
    })
}

fn client_for(server: &MockServer) -> PlatformClient {
    PlatformClient::builder()
        .api_base(format!("{}/v1", server.uri()))
        .access_token("test-token")
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_get_track() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/tracks/111"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(mock_track_json("111", "So What", "Miles Davis")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let track = client.track_details("111").await.unwrap();

    assert_eq!(track.id, "111");
    assert_eq!(track.uri, "spotify:track:111");
    assert_eq!(track.artists, vec!["Miles Davis"]);
    assert_eq!(track.album, "So What (album)");
    assert_eq!(
        track.album_art.as_deref(),
        Some("https://img.example.com/111-640.jpg")
    );
}

#[tokio::test]
async fn test_recently_played_sends_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/me/player/recently-played"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"track": mock_track_json("1", "Blue in Green", "Miles Davis"), "played_at": "2024-06-01T10:00:00Z"},
                {"track": mock_track_json("2", "Naima", "John Coltrane"), "played_at": "2024-06-01T09:55:00Z"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = PlatformClient::builder()
        .api_base(format!("{}/v1", mock_server.uri()))
        .access_token("test-token")
        .recently_played_limit(20)
        .build()
        .unwrap();

    let recent = client.recently_played().await.unwrap();
    let uris: Vec<_> = recent.uris().collect();

    assert_eq!(uris, vec!["spotify:track:1", "spotify:track:2"]);
}

#[tokio::test]
async fn test_queue_snapshot() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/me/player/queue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "currently_playing": mock_track_json("1", "So What", "Miles Davis"),
            "queue": [
                mock_track_json("2", "Giant Steps", "John Coltrane"),
                mock_track_json("3", "Take Five", "Dave Brubeck")
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let snapshot = client.queue_snapshot().await.unwrap();

    assert_eq!(snapshot.currently_playing.as_ref().unwrap().id, "1");
    let ids: Vec<_> = snapshot
        .source_tracks()
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_empty_player_queue() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/me/player/queue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "currently_playing": null,
            "queue": []
        })))
        .mount(&mock_server)
        .await;

    let snapshot = client_for(&mock_server).queue_snapshot().await.unwrap();

    assert!(snapshot.source_tracks().is_empty());
}

#[tokio::test]
async fn test_playlist_tracks_follows_pagination() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/playlists/p1/tracks"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"track": mock_track_json("1", "One", "A")},
                {"track": null}
            ],
            "next": format!("{}/v1/playlists/p1/tracks?offset=100&limit=100", mock_server.uri())
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/playlists/p1/tracks"))
        .and(query_param("offset", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"track": mock_track_json("2", "Two", "B")}],
            "next": null
        })))
        .with_priority(1)
        .mount(&mock_server)
        .await;

    let tracks = client_for(&mock_server)
        .playlist_tracks("p1")
        .await
        .unwrap();

    let ids: Vec<_> = tracks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
}

#[tokio::test]
async fn test_playlist_tracks_skips_local_files() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/playlists/p2/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"track": {
                    "id": null,
                    "name": "Home demo",
                    "uri": "spotify:local:Me:Demos:Home+demo:180",
                    "artists": [{"name": "Me"}]
                }},
                {"track": mock_track_json("3", "Three", "C")}
            ],
            "next": null
        })))
        .mount(&mock_server)
        .await;

    let tracks = client_for(&mock_server)
        .playlist_tracks("p2")
        .await
        .unwrap();

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].uri, "spotify:track:3");
}

#[tokio::test]
async fn test_add_to_queue() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/me/player/queue"))
        .and(query_param("uri", "spotify:track:42"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    client_for(&mock_server)
        .add_to_queue("spotify:track:42")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_status_mapping() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/tracks/expired"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/tracks/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/tracks/busy"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    assert!(client.get_track("expired").await.unwrap_err().is_auth_error());
    assert!(matches!(
        client.get_track("missing").await.unwrap_err(),
        AltPlaylistError::NotFound(_)
    ));
    assert!(client.get_track("busy").await.unwrap_err().is_rate_limit());
}

#[tokio::test]
async fn test_missing_token_fails_without_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = PlatformClient::builder()
        .api_base(format!("{}/v1", mock_server.uri()))
        .build()
        .unwrap();

    let err = client.queue_snapshot().await.unwrap_err();
    assert!(err.is_auth_error());
}
