// End-to-end lobby flows over the builtin catalog

use couch_input::engine::input::{ActionKey, RegistryError, UnresolvedReason};
use couch_input::engine::players::PlayerError;
use couch_input::{
    ActionRegistry, DeviceId, DeviceSession, InputConfig, PlayerManager, PlayerValue,
    VirtualBackend,
};
use winit::keyboard::KeyCode;

fn lobby() -> (ActionRegistry<VirtualBackend>, PlayerManager) {
    let config = InputConfig::builtin().unwrap();
    let players = PlayerManager::new(config.max_players);
    (
        ActionRegistry::initialize(config.catalog, VirtualBackend::new()),
        players,
    )
}

fn tap_button(registry: &mut ActionRegistry<VirtualBackend>, device: DeviceId, button: u8) {
    registry.source_mut().press_button(device, button);
    registry.update();
}

fn release_button(registry: &mut ActionRegistry<VirtualBackend>, device: DeviceId, button: u8) {
    registry.source_mut().release_button(device, button);
    registry.update();
}

#[test]
fn test_keyboard_and_pads_join_in_order() {
    let (mut registry, mut players) = lobby();
    let pad0 = registry.source_mut().connect_joypad(0, "pad-0", "Pad 0");
    let pad1 = registry.source_mut().connect_joypad(1, "pad-1", "Pad 1");
    registry.update();

    tap_button(&mut registry, pad1, 0);
    assert_eq!(players.handle_join_input(&registry, "join"), vec![0]);

    registry.source_mut().press_key(KeyCode::Enter);
    registry.update();
    assert_eq!(players.handle_join_input(&registry, "join"), vec![1]);

    // Still held: no second join for the same press
    registry.update();
    assert!(players.handle_join_input(&registry, "join").is_empty());

    tap_button(&mut registry, pad0, 0);
    assert_eq!(players.handle_join_input(&registry, "join"), vec![2]);

    assert_eq!(players.player_device(0), Ok(pad1));
    assert_eq!(players.player_device(1), Ok(DeviceId::KEYBOARD_MOUSE));
    assert_eq!(players.player_device(2), Ok(pad0));
}

#[test]
fn test_players_act_independently() {
    let (mut registry, mut players) = lobby();
    let pad0 = registry.source_mut().connect_joypad(0, "pad-0", "Pad 0");
    let pad1 = registry.source_mut().connect_joypad(1, "pad-1", "Pad 1");
    registry.update();
    players.join(pad0);
    players.join(pad1);

    let first = DeviceSession::bind(pad0, &mut registry);
    let second = DeviceSession::bind(pad1, &mut registry);

    tap_button(&mut registry, pad1, 2);
    assert!(!first.just_pressed(&registry, "attack", false));
    assert!(second.just_pressed(&registry, "attack", false));
    assert_eq!(players.players_who_pressed(&registry, "attack"), vec![1]);

    registry.source_mut().set_axis(pad0, 0, -1.0);
    registry.update();
    assert_eq!(first.axis(&registry, "move_left", "move_right"), -1.0);
    assert_eq!(second.axis(&registry, "move_left", "move_right"), 0.0);
}

#[test]
fn test_leave_then_rejoin_reuses_slot() {
    let (mut registry, mut players) = lobby();
    let pads: Vec<DeviceId> = (0..3)
        .map(|i| registry.source_mut().connect_joypad(i, "pad", "Pad"))
        .collect();
    registry.update();
    for pad in &pads {
        players.join(*pad);
    }

    players.set_player_data(2, "team", "red");
    players.leave(2);
    assert_eq!(players.player_device(2), Err(PlayerError::NotJoined(2)));

    tap_button(&mut registry, pads[2], 0);
    assert_eq!(players.handle_join_input(&registry, "join"), vec![2]);
    assert_eq!(players.player_data(2, "team"), None);
    assert_eq!(
        players.player_data(2, "device"),
        Some(&PlayerValue::Device(pads[2]))
    );
}

#[test]
fn test_unplugged_pad_goes_quiet() {
    let (mut registry, _players) = lobby();
    let pad = registry.source_mut().connect_joypad(4, "pad-4", "Pad 4");
    registry.update();
    let session = DeviceSession::bind(pad, &mut registry);

    tap_button(&mut registry, pad, 0);
    assert!(session.held(&registry, "jump", false));

    registry.source_mut().disconnect_joypad(pad);
    registry.update();
    assert!(!session.is_connected());
    assert!(!session.held(&registry, "jump", false));
    assert_eq!(
        registry.resolve(pad, "jump"),
        Err(RegistryError::Unresolved {
            device: pad,
            action: "jump".to_string(),
            reason: UnresolvedReason::NotConnected,
        })
    );

    registry.source_mut().connect_joypad(4, "pad-4", "Pad 4");
    registry.update();
    assert!(session.is_connected());
    assert_eq!(registry.resolve(pad, "jump"), Ok(ActionKey::device(pad, "jump")));
}

#[test]
fn test_menu_owner_takes_ui_actions() {
    let (mut registry, _players) = lobby();
    let pad0 = registry.source_mut().connect_joypad(0, "pad-0", "Pad 0");
    let pad1 = registry.source_mut().connect_joypad(1, "pad-1", "Pad 1");
    registry.update();

    let owner = DeviceSession::bind(pad0, &mut registry);
    owner.take_exclusive_ui_actions(&mut registry);

    tap_button(&mut registry, pad1, 0);
    assert!(!registry
        .action_map()
        .state(&ActionKey::logical("ui_accept"))
        .is_pressed(false));
    release_button(&mut registry, pad1, 0);

    tap_button(&mut registry, pad0, 0);
    assert!(registry
        .action_map()
        .state(&ActionKey::logical("ui_accept"))
        .just_pressed(false));

    // Keyboard has lost the menu as well
    release_button(&mut registry, pad0, 0);
    registry.source_mut().press_key(KeyCode::Enter);
    registry.update();
    assert!(!registry.action_map().state(&ActionKey::logical("ui_accept")).just_pressed(false));
}

#[test]
fn test_anyone_can_start() {
    let (mut registry, mut players) = lobby();
    let pad = registry.source_mut().connect_joypad(0, "pad-0", "Pad 0");
    registry.update();
    players.join(DeviceId::KEYBOARD_MOUSE);
    players.join(pad);

    registry.update();
    assert!(!players.any_player_just_pressed(&registry, "start"));

    tap_button(&mut registry, pad, 6);
    assert!(players.any_player_just_pressed(&registry, "start"));
}
