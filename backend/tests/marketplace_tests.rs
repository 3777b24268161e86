//! End-to-end tests over the HTTP router
//!
//! Registration, nearby search, booking, reporting and account deletion,
//! all against the in-memory store.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use common::{completion_in_days, TestApp};
use hirafic_backend::models::GpsCoordinates;
use hirafic_backend::store::Store;

#[tokio::test]
async fn test_client_finds_artisan_nearby() {
    let app = TestApp::new();
    let alice = app.sign_up("alice", "Client", "Algiers").await;
    app.register("bob", "Artisan", "Algiers").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/client/alice/nearby_artisans",
            Some(&alice),
            Some(json!({ "distance": 5000 })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    let artisans = body.as_array().unwrap();
    assert_eq!(artisans.len(), 1);
    assert_eq!(artisans[0]["username"], "bob");
    assert_eq!(artisans[0]["latitude"], 12.34);
    assert_eq!(artisans[0]["longitude"], 56.78);
}

#[tokio::test]
async fn test_nearby_search_respects_radius_and_pages() {
    let app = TestApp::new();
    app.geocoder.place("Oran", GpsCoordinates::new(35.6971, -0.6308));
    let alice = app.sign_up("alice", "Client", "Algiers").await;
    for name in ["zaki", "bob", "karim"] {
        app.register(name, "Artisan", "Algiers").await;
    }
    app.register("faraway", "Artisan", "Oran").await;

    // Default radius of 5 km, sorted by username
    let (status, body) = app
        .request(Method::GET, "/client/alice/nearby_artisans", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["username"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["bob", "karim", "zaki"]);

    let (status, body) = app
        .request(
            Method::GET,
            "/client/alice/nearby_artisans?page=2&per_page=2",
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["current_page"], 2);
    assert_eq!(body["artisans"].as_array().unwrap().len(), 1);
    assert_eq!(body["artisans"][0]["username"], "zaki");

    let (status, _) = app
        .request(
            Method::GET,
            "/client/alice/nearby_artisans?page=0",
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .request(
            Method::POST,
            "/client/alice/nearby_artisans",
            Some(&alice),
            Some(json!({ "distance": -1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_malformed_search_body_is_rejected() {
    let app = TestApp::new();
    let alice = app.sign_up("alice", "Client", "Algiers").await;
    app.register("bob", "Artisan", "Algiers").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/client/alice/nearby_artisans",
            Some(&alice),
            Some(json!({ "distance": "far" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");

    // No body at all still searches with the default radius
    let (status, body) = app
        .request(Method::POST, "/client/alice/nearby_artisans", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["username"], "bob");
}

#[tokio::test]
async fn test_search_reuses_cached_coordinates() {
    let app = TestApp::new();
    let alice = app.sign_up("alice", "Client", "Algiers").await;
    app.register("bob", "Artisan", "Algiers").await;
    let after_registration = app.geocoder.calls();

    for _ in 0..3 {
        let (status, _) = app
            .request(Method::GET, "/client/alice/nearby_artisans", Some(&alice), None)
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(app.geocoder.calls(), after_registration);
}

#[tokio::test]
async fn test_unresolvable_artisans_are_skipped() {
    let app = TestApp::new();
    app.geocoder.forget("Nowhere");
    let alice = app.sign_up("alice", "Client", "Algiers").await;
    app.register("bob", "Artisan", "Algiers").await;
    app.register("ghost", "Artisan", "Nowhere").await;

    let ghost = app.store.find_artisan_by_name("ghost").await.unwrap().unwrap();
    assert!(ghost.latitude.is_none());

    let (status, body) = app
        .request(Method::GET, "/client/alice/nearby_artisans", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unresolvable_client_location_is_not_found() {
    let app = TestApp::new();
    app.geocoder.forget("Atlantis");
    let alice = app.sign_up("alice", "Client", "Atlantis").await;

    let (status, body) = app
        .request(Method::GET, "/client/alice/nearby_artisans", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"]["message"].as_str().unwrap().contains("Atlantis"));

    let alice_profile = app.store.find_client_by_name("alice").await.unwrap().unwrap();
    assert!(alice_profile.latitude.is_none());
    assert!(alice_profile.longitude.is_none());
}

#[tokio::test]
async fn test_nearby_search_is_private() {
    let app = TestApp::new();
    app.sign_up("alice", "Client", "Algiers").await;
    let carol = app.sign_up("carol", "Client", "Algiers").await;

    let (status, _) = app
        .request(Method::GET, "/client/alice/nearby_artisans", Some(&carol), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(Method::GET, "/client/alice/nearby_artisans", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_booking_notifies_artisan() {
    let app = TestApp::new();
    let alice = app.sign_up("alice", "Client", "Algiers").await;
    app.register("bob", "Artisan", "Algiers").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/book_artisan",
            Some(&alice),
            Some(json!({
                "client_email": "alice@example.com",
                "artisan_email": "bob@example.com",
                "details": "Replace the kitchen tiles",
                "completion_date": completion_in_days(365),
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["booking"]["status"], "Pending");
    assert_eq!(body["booking"]["client_name"], "alice");
    assert_eq!(body["booking"]["artisan_name"], "bob");

    let sent = app.mailer.wait_for(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "bob@example.com");
    assert!(sent[0].subject.contains("New Booking from alice"));
    assert!(sent[0].body.contains("Replace the kitchen tiles"));

    let (status, body) = app
        .request(Method::GET, "/bookings", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_booking_in_the_past_is_rejected() {
    let app = TestApp::new();
    let alice = app.sign_up("alice", "Client", "Algiers").await;
    app.register("bob", "Artisan", "Algiers").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/book_artisan",
            Some(&alice),
            Some(json!({
                "client_email": "alice@example.com",
                "artisan_email": "bob@example.com",
                "details": "Paint the hallway",
                "completion_date": completion_in_days(-1),
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("cannot be in the past"));

    let (status, _) = app
        .request(Method::GET, "/bookings", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_booking_errors() {
    let app = TestApp::new();
    let alice = app.sign_up("alice", "Client", "Algiers").await;
    let bob = app.sign_up("bob", "Artisan", "Algiers").await;

    let (status, _) = app
        .request(
            Method::POST,
            "/book_artisan",
            Some(&alice),
            Some(json!({
                "client_email": "alice@example.com",
                "artisan_email": "bob@example.com",
                "details": "Fix the roof",
                "completion_date": "31/12/2030",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            Method::POST,
            "/book_artisan",
            Some(&alice),
            Some(json!({
                "client_email": "alice@example.com",
                "artisan_email": "nobody@example.com",
                "details": "Fix the roof",
                "completion_date": completion_in_days(10),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Artisans cannot book on a client's behalf
    let (status, _) = app
        .request(
            Method::POST,
            "/book_artisan",
            Some(&bob),
            Some(json!({
                "client_email": "alice@example.com",
                "artisan_email": "bob@example.com",
                "details": "Fix the roof",
                "completion_date": completion_in_days(10),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_booking_without_details() {
    let app = TestApp::new();
    let alice = app.sign_up("alice", "Client", "Algiers").await;
    app.register("bob", "Artisan", "Algiers").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/book_artisan",
            Some(&alice),
            Some(json!({
                "client_email": "alice@example.com",
                "artisan_email": "bob@example.com",
                "completion_date": completion_in_days(7),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["booking"]["details"], "");
    assert_eq!(body["booking"]["status"], "Pending");
}

#[tokio::test]
async fn test_account_deletion_waits_for_completed_bookings() {
    let app = TestApp::new();
    let alice = app.sign_up("alice", "Client", "Algiers").await;
    let bob = app.sign_up("bob", "Artisan", "Algiers").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/book_artisan",
            Some(&alice),
            Some(json!({
                "client_email": "alice@example.com",
                "artisan_email": "bob@example.com",
                "details": "Install a water heater",
                "completion_date": completion_in_days(7),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let booking_id: Uuid = body["booking"]["id"].as_str().unwrap().parse().unwrap();

    let (status, body) = app
        .request(Method::DELETE, "/delete_account", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/bookings/{booking_id}/status"),
            Some(&bob),
            Some(json!({ "status": "Completed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "Completed");

    let (status, _) = app
        .request(Method::DELETE, "/delete_account", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    assert!(app.store.find_booking(booking_id).await.unwrap().is_none());
    assert!(app.store.find_client_by_name("alice").await.unwrap().is_none());
    assert!(app
        .store
        .find_credentials_by_email("alice@example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_status_transitions_over_http() {
    let app = TestApp::new();
    let alice = app.sign_up("alice", "Client", "Algiers").await;
    let bob = app.sign_up("bob", "Artisan", "Algiers").await;

    let (_, body) = app
        .request(
            Method::POST,
            "/book_artisan",
            Some(&alice),
            Some(json!({
                "client_email": "alice@example.com",
                "artisan_email": "bob@example.com",
                "details": "Build a bookshelf",
                "completion_date": completion_in_days(14),
            })),
        )
        .await;
    let uri = format!("/bookings/{}/status", body["booking"]["id"].as_str().unwrap());

    let (status, _) = app
        .request(Method::PATCH, &uri, Some(&alice), Some(json!({ "status": "Accepted" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(Method::PATCH, &uri, Some(&bob), Some(json!({ "status": "Rejected" })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request(Method::PATCH, &uri, Some(&bob), Some(json!({ "status": "Completed" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_STATE_TRANSITION");

    let (status, _) = app
        .request(Method::PATCH, &uri, Some(&bob), Some(json!({ "status": "Done" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_report_goes_to_operations() {
    let app = TestApp::new();
    let alice = app.sign_up("alice", "Client", "Algiers").await;
    app.register("bob", "Artisan", "Algiers").await;

    let (_, body) = app
        .request(
            Method::POST,
            "/book_artisan",
            Some(&alice),
            Some(json!({
                "client_email": "alice@example.com",
                "artisan_email": "bob@example.com",
                "details": "Fix the fence",
                "completion_date": completion_in_days(2),
            })),
        )
        .await;
    let booking_id = body["booking"]["id"].as_str().unwrap().to_string();
    app.mailer.wait_for(1).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/report",
            Some(&alice),
            Some(json!({
                "client_name": "alice",
                "artisan_name": "bob",
                "issue": "Left the job half done",
                "booking_id": booking_id,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["report"]["issue"], "Left the job half done");

    let sent = app.mailer.wait_for(2).await;
    let report_mail = sent.iter().find(|m| m.to == "ops@hirafic.test").unwrap();
    assert!(report_mail.body.contains(&booking_id));
    assert!(report_mail.body.contains("Left the job half done"));

    let (status, _) = app
        .request(
            Method::POST,
            "/report",
            Some(&alice),
            Some(json!({
                "client_name": "alice",
                "artisan_name": "bob",
                "issue": "",
                "booking_id": booking_id,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_registration_rules() {
    let app = TestApp::new();
    app.register("alice", "Client", "Algiers").await;

    // Email comparison ignores case
    let (status, body) = app
        .request(
            Method::POST,
            "/register",
            None,
            Some(json!({
                "username": "alice2",
                "email": "ALICE@example.com",
                "password": "password123",
                "confirm_password": "password123",
                "phone_number": "0555 123 456",
                "location": "Oran",
                "role": "Client",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "DUPLICATE_ENTRY");

    let (status, body) = app
        .request(
            Method::POST,
            "/register",
            None,
            Some(json!({
                "username": "dora",
                "email": "dora@example.com",
                "password": "password123",
                "confirm_password": "password124",
                "phone_number": "0555 123 456",
                "location": "Oran",
                "role": "Client",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "confirm_password");

    let (status, _) = app
        .request(
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_edit_regeocodes_new_location() {
    let app = TestApp::new();
    app.geocoder.place("Oran", GpsCoordinates::new(35.6971, -0.6308));
    let bob = app.sign_up("bob", "Artisan", "Algiers").await;

    let (status, body) = app
        .request(
            Method::PUT,
            "/artisan/bob",
            Some(&bob),
            Some(json!({ "location": "Oran", "specialization": "Carpenter" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["profile"]["specialization"], "Carpenter");

    let (status, body) = app
        .request(Method::GET, "/location", Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lat"], 35.6971);
    assert_eq!(body["long"], -0.6308);

    let (status, _) = app
        .request(Method::GET, "/client/bob", Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_artisan_directory() {
    let app = TestApp::new();

    let (status, _) = app.request(Method::GET, "/artisans", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.register("bob", "Artisan", "Algiers").await;
    app.register("amine", "Artisan", "Blida").await;

    let (status, body) = app.request(Method::GET, "/artisans?page=1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_pages"], 1);
    assert_eq!(body["artisans"][0]["username"], "amine");
    assert_eq!(body["artisans"][1]["username"], "bob");
}
