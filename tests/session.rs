//! End-to-end session over the in-memory gateway: JSON in, JSON out.

use orb_arena::net::{ChannelEvent, ConnectionState, MemoryGateway};
use orb_arena::{Client, Settings};
use serde_json::Value;

const SNAPSHOT: &str = r#"{
    "type": "sessionState",
    "session": {
        "id": "s1",
        "worldWidth": 1000,
        "worldHeight": 1000,
        "players": {
            "me": {"id": "me", "x": 0, "y": 0, "angle": 0, "hp": 100, "maxHp": 100},
            "p2": {"id": "p2", "x": 600, "y": 600, "angle": 0, "hp": 100, "maxHp": 100}
        },
        "bullets": {},
        "xpItems": {"k1": {"id": "orb1", "x": 400, "y": 300, "value": 1}},
        "xpAreas": {}
    }
}"#;

fn parse(frames: &[String]) -> Vec<Value> {
    frames
        .iter()
        .map(|f| serde_json::from_str(f).expect("client sent invalid json"))
        .collect()
}

fn joined_client() -> Client<MemoryGateway> {
    let mut gateway = MemoryGateway::new();
    gateway.push(ChannelEvent::Connected);
    gateway.push_text(r#"{"type":"id","id":"me","session":"s1"}"#);
    gateway.push_text(SNAPSHOT);
    let mut client = Client::new(Settings::with_seed(7), gateway);
    client.step();
    client
}

#[test]
fn join_then_collect_orb() {
    let mut client = joined_client();
    assert_eq!(client.connection(), ConnectionState::Connected);
    assert_eq!(client.state().world.players.len(), 2);

    // 1 xp at 10 xp/s drains in 6 frames; the first already ran
    for _ in 0..5 {
        client.step();
    }
    assert!(client.state().world.orbs.is_empty());

    let sent = parse(client.gateway().sent());
    assert_eq!(sent.iter().filter(|m| m["type"] == "move").count(), 6);
    let collected: Vec<_> = sent.iter().filter(|m| m["type"] == "orbCollected").collect();
    assert_eq!(collected.len(), 1);
    assert_eq!(collected[0]["id"], "orb1");

    // Server answers with a fresh snapshot that still has the orb (lost notice)
    client.gateway_mut().push_text(SNAPSHOT);
    client.pump();
    assert_eq!(client.state().world.orbs.len(), 1);
}

#[test]
fn peer_moves_and_shots() {
    let mut client = joined_client();
    client.gateway_mut().take_sent();

    client
        .gateway_mut()
        .push_text(r#"{"type":"move","id":"p2","x":610,"y":620,"angle":3.0}"#);
    client
        .gateway_mut()
        .push_text(r#"{"type":"shoot","id":"p2","bullet":{"x":610,"y":620,"vx":-2.5,"vy":0}}"#);
    client.input_mut().fire = true;
    client.step();

    let p2 = &client.state().world.players["p2"];
    assert_eq!((p2.pos.x, p2.pos.y, p2.angle), (610.0, 620.0, 3.0));
    assert_eq!(client.state().world.bullets.len(), 2);

    let sent = parse(&client.gateway_mut().take_sent());
    let shoot = sent.iter().find(|m| m["type"] == "shoot").expect("shoot sent");
    assert_eq!(shoot["id"], "me");
    assert_eq!(shoot["bullet"]["vx"], 2.5);

    // Our own shot echoed back is not duplicated
    let echo = serde_json::to_string(shoot).unwrap();
    client.gateway_mut().push_text(echo);
    client.step();
    assert_eq!(client.state().world.bullets.len(), 2);
}

#[test]
fn garbage_and_unknown_frames_do_not_stop_the_loop() {
    let mut client = joined_client();
    client.gateway_mut().push_text("]]]");
    client.gateway_mut().push_text(r#"{"type":"scoreboard","rows":[]}"#);
    client.gateway_mut().push(ChannelEvent::Error("reset by peer".into()));
    client.input_mut().down = true;
    client.step();

    assert_eq!(client.state().world.local_player().unwrap().pos.y, 302.0);
    assert_eq!(client.connection(), ConnectionState::Connected);
}
