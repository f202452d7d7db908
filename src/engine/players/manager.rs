// Player session manager: player slots bound to devices

use super::data::{PlayerData, PlayerValue};
use crate::engine::input::{ActionRegistry, DeviceId, DeviceSource};
use log::info;
use std::collections::BTreeMap;

/// Default number of player slots
pub const MAX_PLAYERS: usize = crate::engine::input::catalog::DEFAULT_MAX_PLAYERS;

/// Player management errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayerError {
    #[error("Player {0} has not joined")]
    NotJoined(usize),
}

/// Join/leave notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    Joined(usize),
    Left(usize),
}

/// A joined player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSession {
    /// Device the player joined with, fixed for the slot's lifetime
    device: DeviceId,

    data: PlayerData,
}

impl PlayerSession {
    pub fn device(&self) -> DeviceId {
        self.device
    }

    pub fn data(&self) -> &PlayerData {
        &self.data
    }
}

type Listener = Box<dyn FnMut(PlayerEvent)>;

/// Maps player slots to devices and per-player data
///
/// A slot is joined iff it has an entry. Slots are reused: a join always
/// takes the lowest free one. Several slots may share a device.
pub struct PlayerManager {
    players: BTreeMap<usize, PlayerSession>,

    /// Maximum number of simultaneous players
    max_players: usize,

    listeners: Vec<Listener>,
}

impl PlayerManager {
    /// Create a manager with `max_players` slots
    pub fn new(max_players: usize) -> Self {
        Self {
            players: BTreeMap::new(),
            max_players,
            listeners: Vec::new(),
        }
    }

    /// Register a join/leave listener. Listeners run synchronously, in registration order.
    pub fn subscribe(&mut self, listener: impl FnMut(PlayerEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Join a player on `device`, taking the lowest free slot.
    ///
    /// Returns `None` when every slot is taken. Does not check whether the
    /// device already belongs to another player.
    pub fn join(&mut self, device: DeviceId) -> Option<usize> {
        let Some(player) = (0..self.max_players).find(|slot| !self.players.contains_key(slot))
        else {
            info!("Device {} cannot join: all {} slots taken", device, self.max_players);
            return None;
        };

        self.players.insert(
            player,
            PlayerSession {
                device,
                data: PlayerData::for_device(device),
            },
        );
        info!("Player {} joined on device {}", player, device);
        self.notify(PlayerEvent::Joined(player));
        Some(player)
    }

    /// Remove a player. Leaving an unjoined slot does nothing.
    pub fn leave(&mut self, player: usize) {
        if self.players.remove(&player).is_some() {
            info!("Player {} left", player);
            self.notify(PlayerEvent::Left(player));
        }
    }

    /// Device a player joined with
    pub fn player_device(&self, player: usize) -> Result<DeviceId, PlayerError> {
        self.players
            .get(&player)
            .map(PlayerSession::device)
            .ok_or(PlayerError::NotJoined(player))
    }

    /// Get a player's value (`None` for unknown keys or unjoined slots)
    pub fn player_data(&self, player: usize, key: &str) -> Option<&PlayerValue> {
        self.players.get(&player).and_then(|p| p.data.get(key))
    }

    /// Set a player's value. Unjoined slots are left untouched.
    pub fn set_player_data(&mut self, player: usize, key: &str, value: impl Into<PlayerValue>) {
        if let Some(session) = self.players.get_mut(&player) {
            session.data.set(key, value);
        }
    }

    pub fn player(&self, player: usize) -> Option<&PlayerSession> {
        self.players.get(&player)
    }

    pub fn is_joined(&self, player: usize) -> bool {
        self.players.contains_key(&player)
    }

    /// Check if any joined player uses `device`
    pub fn is_device_joined(&self, device: DeviceId) -> bool {
        self.players.values().any(|p| p.device == device)
    }

    /// Joined slots in ascending order
    pub fn joined_players(&self) -> Vec<usize> {
        self.players.keys().copied().collect()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    /// Connected devices that no player uses yet, keyboard/mouse last
    pub fn unjoined_devices<S: DeviceSource + ?Sized>(&self, source: &S) -> Vec<DeviceId> {
        let mut devices = source.connected_joypads();
        devices.push(DeviceId::KEYBOARD_MOUSE);
        devices.retain(|device| !self.is_device_joined(*device));
        devices
    }

    /// Join every free device that just pressed `action`. Returns the new slots.
    pub fn handle_join_input<S: DeviceSource>(
        &mut self,
        registry: &ActionRegistry<S>,
        action: &str,
    ) -> Vec<usize> {
        let mut joined = Vec::new();
        for device in self.unjoined_devices(registry.source()) {
            if registry.just_pressed(device, action, false).unwrap_or(false) {
                if let Some(player) = self.join(device) {
                    joined.push(player);
                }
            }
        }
        joined
    }

    /// Check if any joined player's device just pressed `action`
    pub fn any_player_just_pressed<S: DeviceSource>(
        &self,
        registry: &ActionRegistry<S>,
        action: &str,
    ) -> bool {
        self.players
            .values()
            .any(|p| registry.just_pressed(p.device, action, false).unwrap_or(false))
    }

    /// Joined players whose device just pressed `action`
    pub fn players_who_pressed<S: DeviceSource>(
        &self,
        registry: &ActionRegistry<S>,
        action: &str,
    ) -> Vec<usize> {
        self.players
            .iter()
            .filter(|(_, p)| registry.just_pressed(p.device, action, false).unwrap_or(false))
            .map(|(player, _)| *player)
            .collect()
    }

    fn notify(&mut self, event: PlayerEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}

impl Default for PlayerManager {
    fn default() -> Self {
        Self::new(MAX_PLAYERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::{ActionCatalog, InputEvent, VirtualBackend};
    use std::cell::RefCell;
    use std::rc::Rc;
    use winit::keyboard::KeyCode;

    fn recorder(manager: &mut PlayerManager) -> Rc<RefCell<Vec<PlayerEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        manager.subscribe(move |event| sink.borrow_mut().push(event));
        events
    }

    fn registry() -> ActionRegistry<VirtualBackend> {
        let mut catalog = ActionCatalog::new();
        catalog
            .add_action_with_events(
                "join",
                0.5,
                vec![InputEvent::key(KeyCode::Enter), InputEvent::joypad_button(0)],
            )
            .unwrap();
        catalog
            .add_action_with_events(
                "start",
                0.5,
                vec![InputEvent::key(KeyCode::Space), InputEvent::joypad_button(6)],
            )
            .unwrap();
        ActionRegistry::initialize(catalog, VirtualBackend::new())
    }

    #[test]
    fn test_manager_creation() {
        let manager = PlayerManager::default();
        assert_eq!(manager.max_players(), MAX_PLAYERS);
        assert_eq!(manager.player_count(), 0);
        assert!(!manager.is_joined(0));
    }

    #[test]
    fn test_join_fills_slots_in_order() {
        let mut manager = PlayerManager::new(8);
        assert_eq!(manager.join(DeviceId::KEYBOARD_MOUSE), Some(0));
        for device in 0..7 {
            assert_eq!(manager.join(DeviceId::joypad(device)), Some(device as usize + 1));
        }
        assert_eq!(manager.player_count(), 8);

        let before = manager.joined_players();
        assert_eq!(manager.join(DeviceId::joypad(9)), None);
        assert_eq!(manager.joined_players(), before);
        assert!(!manager.is_device_joined(DeviceId::joypad(9)));
    }

    #[test]
    fn test_join_notifies() {
        let mut manager = PlayerManager::new(1);
        let events = recorder(&mut manager);

        manager.join(DeviceId::joypad(0));
        manager.join(DeviceId::joypad(1));
        assert_eq!(*events.borrow(), vec![PlayerEvent::Joined(0)]);
    }

    #[test]
    fn test_leave_and_reuse_slot() {
        let mut manager = PlayerManager::new(4);
        manager.join(DeviceId::KEYBOARD_MOUSE);
        manager.join(DeviceId::joypad(0));
        assert_eq!(manager.join(DeviceId::joypad(1)), Some(2));

        let events = recorder(&mut manager);
        manager.leave(2);
        assert!(!manager.is_joined(2));
        assert_eq!(*events.borrow(), vec![PlayerEvent::Left(2)]);

        assert_eq!(manager.join(DeviceId::joypad(1)), Some(2));
        assert_eq!(manager.player_device(2), Ok(DeviceId::joypad(1)));
    }

    #[test]
    fn test_leave_unjoined_is_noop() {
        let mut manager = PlayerManager::new(4);
        manager.join(DeviceId::joypad(0));
        let events = recorder(&mut manager);

        manager.leave(3);
        assert_eq!(manager.player_count(), 1);
        assert_eq!(manager.joined_players(), vec![0]);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_shared_device_is_allowed() {
        let mut manager = PlayerManager::new(4);
        assert_eq!(manager.join(DeviceId::joypad(6)), Some(0));
        assert_eq!(manager.join(DeviceId::joypad(6)), Some(1));
        assert_eq!(manager.player_device(1), Ok(DeviceId::joypad(6)));
    }

    #[test]
    fn test_player_device_unjoined_fails() {
        let manager = PlayerManager::new(4);
        assert_eq!(manager.player_device(0), Err(PlayerError::NotJoined(0)));
    }

    #[test]
    fn test_player_data_round_trip() {
        let mut manager = PlayerManager::new(4);
        let player = manager.join(DeviceId::joypad(0)).unwrap();

        manager.set_player_data(player, "team", "blue");
        assert_eq!(
            manager.player_data(player, "team"),
            Some(&PlayerValue::from("blue"))
        );
        assert_eq!(
            manager.player_data(player, "device"),
            Some(&PlayerValue::Device(DeviceId::joypad(0)))
        );
        assert_eq!(manager.player_data(player, "loadout"), None);
    }

    #[test]
    fn test_set_player_data_unjoined_is_noop() {
        let mut manager = PlayerManager::new(4);
        let player = manager.join(DeviceId::joypad(0)).unwrap();
        manager.set_player_data(player, "team", "blue");
        manager.leave(player);

        manager.set_player_data(player, "team", "red");
        assert_eq!(manager.player_data(player, "team"), None);
        assert!(!manager.is_joined(player));
    }

    #[test]
    fn test_rejoin_starts_with_fresh_data() {
        let mut manager = PlayerManager::new(4);
        let player = manager.join(DeviceId::joypad(0)).unwrap();
        manager.set_player_data(player, "team", "blue");
        manager.leave(player);

        let player = manager.join(DeviceId::joypad(1)).unwrap();
        assert_eq!(manager.player_data(player, "team"), None);
        assert_eq!(manager.player(player).unwrap().data().len(), 1);
    }

    #[test]
    fn test_unjoined_devices() {
        let mut backend = VirtualBackend::new();
        let pad0 = backend.connect_joypad(0, "a", "A");
        let pad1 = backend.connect_joypad(1, "b", "B");
        let mut manager = PlayerManager::new(4);

        assert_eq!(
            manager.unjoined_devices(&backend),
            vec![pad0, pad1, DeviceId::KEYBOARD_MOUSE]
        );

        manager.join(pad1);
        manager.join(DeviceId::KEYBOARD_MOUSE);
        assert_eq!(manager.unjoined_devices(&backend), vec![pad0]);
    }

    #[test]
    fn test_handle_join_input() {
        let mut registry = registry();
        let pad = registry.source_mut().connect_joypad(0, "a", "A");
        registry.update();
        let mut manager = PlayerManager::new(4);

        registry.source_mut().press_button(pad, 0);
        registry.source_mut().press_key(KeyCode::Enter);
        registry.update();
        assert_eq!(manager.handle_join_input(&registry, "join"), vec![0, 1]);
        assert_eq!(manager.player_device(0), Ok(pad));
        assert_eq!(manager.player_device(1), Ok(DeviceId::KEYBOARD_MOUSE));

        // Already joined devices are skipped
        assert!(manager.handle_join_input(&registry, "join").is_empty());
    }

    #[test]
    fn test_any_player_just_pressed() {
        let mut registry = registry();
        let pad = registry.source_mut().connect_joypad(0, "a", "A");
        registry.update();
        let mut manager = PlayerManager::new(4);
        manager.join(pad);

        registry.source_mut().press_key(KeyCode::Space);
        registry.update();
        assert!(!manager.any_player_just_pressed(&registry, "start"));

        registry.source_mut().press_button(pad, 6);
        registry.update();
        assert!(manager.any_player_just_pressed(&registry, "start"));
        assert_eq!(manager.players_who_pressed(&registry, "start"), vec![0]);
    }
}
