//! End-to-end tests over real UDP sockets: a relay on an ephemeral port,
//! plain `UdpSocket` clients speaking the JSON wire format.

use std::time::Duration;

use serde_json::json;
use tokio::net::UdpSocket;
use voxhall_protocol::{ClientId, Envelope, MessageType, RoomId};
use voxhall_relay::{RelayHandle, RelayServerBuilder};

async fn start() -> RelayHandle {
    let server = RelayServerBuilder::new()
        .bind("127.0.0.1:0")
        .build()
        .await
        .unwrap();
    server.spawn()
}

async fn client(relay: &RelayHandle) -> UdpSocket {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket.connect(relay.local_addr()).await.unwrap();
    socket
}

async fn send(socket: &UdpSocket, env: &Envelope) {
    socket.send(&serde_json::to_vec(env).unwrap()).await.unwrap();
}

async fn recv(socket: &UdpSocket) -> Envelope {
    let mut buf = vec![0u8; 4096];
    let len = tokio::time::timeout(Duration::from_secs(2), socket.recv(&mut buf))
        .await
        .expect("timed out waiting for a datagram")
        .unwrap();
    serde_json::from_slice(&buf[..len]).unwrap()
}

/// Asserts nothing arrives on `socket` within a short window.
async fn assert_silent(socket: &UdpSocket) {
    let mut buf = vec![0u8; 4096];
    let result =
        tokio::time::timeout(Duration::from_millis(200), socket.recv(&mut buf)).await;
    assert!(result.is_err(), "expected silence, got a datagram");
}

/// Sends a `hello` and returns the assigned id.
async fn register(socket: &UdpSocket) -> ClientId {
    send(socket, &Envelope::request(MessageType::Hello)).await;
    let reply = recv(socket).await;
    assert_eq!(reply.kind, MessageType::ClientRegistered);
    reply.client_id.expect("assigned id")
}

/// Joins a room and returns the `room_users` membership snapshot.
async fn join(socket: &UdpSocket, id: &ClientId, room: &str) -> Envelope {
    let mut env = Envelope::request(MessageType::JoinRoom);
    env.client_id = Some(id.clone());
    env.room_id = Some(RoomId::from(room));
    send(socket, &env).await;
    let snapshot = recv(socket).await;
    assert_eq!(snapshot.kind, MessageType::RoomUsers);
    snapshot
}

// -------------------------------------------------------------------------
// Registration
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_first_contact_assigns_identity() {
    let relay = start().await;
    let a = client(&relay).await;

    let id = register(&a).await;
    let raw = id.as_str();
    assert!(raw.starts_with("client_"), "unexpected id shape: {raw}");
    assert_eq!(raw.len(), "client_".len() + 6);
    assert!(raw["client_".len()..].chars().all(|c| c.is_ascii_digit()));

    relay.stop().await;
}

#[tokio::test]
async fn test_each_client_gets_a_distinct_id() {
    let relay = start().await;
    let a = client(&relay).await;
    let b = client(&relay).await;

    let id_a = register(&a).await;
    let id_b = register(&b).await;
    assert_ne!(id_a, id_b);

    relay.stop().await;
}

#[tokio::test]
async fn test_claimed_id_is_rebound_to_new_source_address() {
    let relay = start().await;
    let a = client(&relay).await;
    let b = client(&relay).await;
    let id_a = register(&a).await;
    let id_b = register(&b).await;

    // Same identity shows up from a fresh socket (e.g. after a NAT rebind).
    let a2 = client(&relay).await;
    let mut hello = Envelope::request(MessageType::Hello);
    hello.client_id = Some(id_a.clone());
    send(&a2, &hello).await;
    // hello gets no reply; give the relay a moment to process it before
    // the offer races it.
    tokio::time::sleep(Duration::from_millis(50)).await;

    // A targeted message for that id now lands on the new socket.
    let mut offer = Envelope::request(MessageType::Offer);
    offer.client_id = Some(id_b);
    offer.target = Some(id_a);
    offer.data = json!({ "sdp": "v=0..." });
    send(&b, &offer).await;

    let relayed = recv(&a2).await;
    assert_eq!(relayed.kind, MessageType::Offer);
    assert_silent(&a).await;

    relay.stop().await;
}

// -------------------------------------------------------------------------
// Rooms
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_join_snapshots_membership_and_notifies_the_room() {
    let relay = start().await;
    let a = client(&relay).await;
    let b = client(&relay).await;
    let id_a = register(&a).await;
    let id_b = register(&b).await;

    // First joiner sees an empty room.
    let snapshot = join(&a, &id_a, "lobby").await;
    assert_eq!(snapshot.data["users"], json!([]));

    // Second joiner sees the first; the first hears about the second.
    let snapshot = join(&b, &id_b, "lobby").await;
    assert_eq!(snapshot.data["users"], json!([id_a.as_str()]));

    let joined = recv(&a).await;
    assert_eq!(joined.kind, MessageType::UserJoined);
    assert_eq!(joined.data["user_id"], json!(id_b.as_str()));

    relay.stop().await;
}

#[tokio::test]
async fn test_leave_notifies_remaining_members() {
    let relay = start().await;
    let a = client(&relay).await;
    let b = client(&relay).await;
    let id_a = register(&a).await;
    let id_b = register(&b).await;
    join(&a, &id_a, "lobby").await;
    join(&b, &id_b, "lobby").await;
    let _ = recv(&a).await; // user_joined for b

    let mut env = Envelope::request(MessageType::LeaveRoom);
    env.client_id = Some(id_a.clone());
    send(&a, &env).await;

    let left = recv(&b).await;
    assert_eq!(left.kind, MessageType::UserLeft);
    assert_eq!(left.data["user_id"], json!(id_a.as_str()));
    assert_silent(&a).await;

    relay.stop().await;
}

#[tokio::test]
async fn test_switching_rooms_leaves_the_previous_one() {
    let relay = start().await;
    let a = client(&relay).await;
    let b = client(&relay).await;
    let id_a = register(&a).await;
    let id_b = register(&b).await;
    join(&a, &id_a, "red").await;
    join(&b, &id_b, "red").await;
    let _ = recv(&a).await; // user_joined for b

    let snapshot = join(&a, &id_a, "blue").await;
    assert_eq!(snapshot.data["users"], json!([]));

    let left = recv(&b).await;
    assert_eq!(left.kind, MessageType::UserLeft);
    assert_eq!(left.data["user_id"], json!(id_a.as_str()));

    relay.stop().await;
}

#[tokio::test]
async fn test_join_registers_unknown_sender_first() {
    let relay = start().await;
    let a = client(&relay).await;

    // A join from a never-seen socket: registration reply comes first,
    // then the membership snapshot.
    let mut env = Envelope::request(MessageType::JoinRoom);
    env.room_id = Some(RoomId::from("lobby"));
    send(&a, &env).await;

    let registered = recv(&a).await;
    assert_eq!(registered.kind, MessageType::ClientRegistered);
    assert!(registered.client_id.is_some());

    let snapshot = recv(&a).await;
    assert_eq!(snapshot.kind, MessageType::RoomUsers);
    assert_eq!(snapshot.data["users"], json!([]));

    relay.stop().await;
}

// -------------------------------------------------------------------------
// Negotiation relay
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_targeted_offer_reaches_only_the_target() {
    let relay = start().await;
    let a = client(&relay).await;
    let b = client(&relay).await;
    let c = client(&relay).await;
    let id_a = register(&a).await;
    let id_b = register(&b).await;
    let _id_c = register(&c).await;

    let mut offer = Envelope::request(MessageType::Offer);
    offer.client_id = Some(id_a.clone());
    offer.target = Some(id_b);
    offer.data = json!({ "sdp": "v=0 offer" });
    send(&a, &offer).await;

    let relayed = recv(&b).await;
    assert_eq!(relayed.kind, MessageType::Offer);
    assert_eq!(relayed.sender, Some(id_a));
    assert_eq!(relayed.data["sdp"], "v=0 offer");
    assert!(relayed.timestamp.is_some());
    assert_silent(&a).await;
    assert_silent(&c).await;

    relay.stop().await;
}

#[tokio::test]
async fn test_untargeted_offer_broadcasts_to_room_except_sender() {
    let relay = start().await;
    let a = client(&relay).await;
    let b = client(&relay).await;
    let c = client(&relay).await;
    let id_a = register(&a).await;
    let id_b = register(&b).await;
    let id_c = register(&c).await;
    join(&a, &id_a, "lobby").await;
    join(&b, &id_b, "lobby").await;
    join(&c, &id_c, "lobby").await;
    let _ = recv(&a).await; // user_joined for b
    let _ = recv(&a).await; // user_joined for c
    let _ = recv(&b).await; // user_joined for c

    let mut offer = Envelope::request(MessageType::Offer);
    offer.client_id = Some(id_a.clone());
    offer.data = json!({ "sdp": "v=0 group" });
    send(&a, &offer).await;

    for socket in [&b, &c] {
        let relayed = recv(socket).await;
        assert_eq!(relayed.kind, MessageType::Offer);
        assert_eq!(relayed.sender, Some(id_a.clone()));
        assert_eq!(relayed.data["sdp"], "v=0 group");
    }
    assert_silent(&a).await;

    relay.stop().await;
}

#[tokio::test]
async fn test_answer_and_ice_candidate_are_relayed_with_sender() {
    let relay = start().await;
    let a = client(&relay).await;
    let b = client(&relay).await;
    let id_a = register(&a).await;
    let id_b = register(&b).await;

    for kind in [MessageType::Answer, MessageType::IceCandidate] {
        let mut env = Envelope::request(kind);
        env.client_id = Some(id_a.clone());
        env.target = Some(id_b.clone());
        env.data = json!({ "blob": "opaque" });
        send(&a, &env).await;

        let relayed = recv(&b).await;
        assert_eq!(relayed.kind, kind);
        assert_eq!(relayed.sender, Some(id_a.clone()));
        assert_eq!(relayed.data["blob"], "opaque");
    }

    relay.stop().await;
}

#[tokio::test]
async fn test_untargeted_answer_is_dropped() {
    let relay = start().await;
    let a = client(&relay).await;
    let b = client(&relay).await;
    let id_a = register(&a).await;
    let id_b = register(&b).await;
    join(&a, &id_a, "lobby").await;
    join(&b, &id_b, "lobby").await;
    let _ = recv(&a).await; // user_joined for b

    let mut env = Envelope::request(MessageType::Answer);
    env.client_id = Some(id_a);
    env.data = json!({ "sdp": "v=0..." });
    send(&a, &env).await;

    assert_silent(&b).await;

    relay.stop().await;
}

// -------------------------------------------------------------------------
// Resilience
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_malformed_datagram_does_not_take_the_relay_down() {
    let relay = start().await;
    let a = client(&relay).await;

    a.send(b"not json at all").await.unwrap();
    a.send(b"[1, 2, 3]").await.unwrap();
    assert_silent(&a).await;

    // Still serving.
    let id = register(&a).await;
    assert!(!id.is_empty());

    relay.stop().await;
}

#[tokio::test]
async fn test_unrecognized_type_is_ignored_silently() {
    let relay = start().await;
    let a = client(&relay).await;
    let id = register(&a).await;

    let raw = json!({ "type": "fly_to_moon", "client_id": id.as_str() });
    a.send(&serde_json::to_vec(&raw).unwrap()).await.unwrap();

    assert_silent(&a).await;

    relay.stop().await;
}

// -------------------------------------------------------------------------
// Lifecycle
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_stats_track_clients_and_rooms() {
    let relay = start().await;
    let a = client(&relay).await;
    let b = client(&relay).await;
    let id_a = register(&a).await;
    let id_b = register(&b).await;
    join(&a, &id_a, "lobby").await;
    join(&b, &id_b, "lobby").await;
    let _ = recv(&a).await; // user_joined for b

    let stats = relay.stats().await;
    assert_eq!(stats.clients, 2);
    assert_eq!(stats.rooms, 1);

    relay.stop().await;
}

#[tokio::test]
async fn test_stop_terminates_the_receive_loop() {
    let relay = start().await;
    let a = client(&relay).await;
    let _ = register(&a).await;

    relay.stop().await;

    // The socket is gone; a new message gets no reply. Depending on the
    // host, the closed port surfaces as silence or as an ICMP-driven
    // error on the connected socket — either is a correct shutdown.
    let _ = a
        .send(&serde_json::to_vec(&Envelope::request(MessageType::Hello)).unwrap())
        .await;
    let mut buf = vec![0u8; 4096];
    match tokio::time::timeout(Duration::from_millis(200), a.recv(&mut buf)).await {
        Err(_) | Ok(Err(_)) => {}
        Ok(Ok(_)) => panic!("received a datagram after shutdown"),
    }
}
