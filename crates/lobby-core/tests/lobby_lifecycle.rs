// crates/lobby-core/tests/lobby_lifecycle.rs
use lobby_core::{
    ConnectionId, Effect, LobbyCode, LobbyError, LobbyManager, MachineInfo, MachineUpdate, Player,
    PlayerUpdate, ServerEvent, SongInfo, SpectatorInfo, LOBBY_CLOSED_REASON,
};

fn conn(id: u64) -> ConnectionId {
    ConnectionId(id)
}

fn player(id: &str, name: &str, screen: &str) -> Player {
    Player {
        player_id: id.to_string(),
        profile_name: name.to_string(),
        screen_name: screen.to_string(),
        ready: false,
        score: None,
        progress: None,
    }
}

fn machine(name: &str) -> MachineInfo {
    MachineInfo {
        player1: Some(player("P1", name, "select")),
        player2: None,
    }
}

fn spectator(name: &str) -> SpectatorInfo {
    SpectatorInfo {
        profile_name: name.to_string(),
    }
}

fn song(title: &str) -> SongInfo {
    SongInfo {
        song_path: format!("Songs/Pack/{title}"),
        title: title.to_string(),
        artist: "Artist".to_string(),
        step_artist: "Stepper".to_string(),
        length_seconds: 120.5,
    }
}

fn screen(name: &str) -> MachineUpdate {
    MachineUpdate {
        player1: Some(PlayerUpdate {
            screen_name: Some(name.to_string()),
            ..PlayerUpdate::default()
        }),
        player2: None,
    }
}

/// Every machine/spectator entry is mirrored in the reverse indices and
/// the room index, and no connection holds two roles.
fn assert_consistent(manager: &LobbyManager) {
    for summary in manager.search_lobbies() {
        let lobby = manager.lobby(&summary.code).expect("listed lobby exists");
        assert!(!lobby.machines.is_empty(), "lobby {} has no machines", lobby.code);

        for id in lobby.machines.keys() {
            assert_eq!(manager.machine_lobby(*id), Some(&lobby.code));
            assert_eq!(manager.spectator_lobby(*id), None);
            assert!(manager.rooms().is_joined(*id, &lobby.code));
        }
        for id in lobby.spectators.keys() {
            assert_eq!(manager.spectator_lobby(*id), Some(&lobby.code));
            assert_eq!(manager.machine_lobby(*id), None);
            assert!(manager.rooms().is_joined(*id, &lobby.code));
        }
        assert_eq!(
            manager.rooms().member_count(&lobby.code),
            lobby.machines.len() + lobby.spectators.len()
        );
    }
    assert_eq!(manager.rooms().room_count(), manager.lobby_count());
}

#[test]
fn create_lobby_returns_fresh_uppercase_code() {
    let mut manager = LobbyManager::with_seed(7);

    let first = manager.create_lobby(conn(1), machine("ALICE"), "");
    let second = manager.create_lobby(conn(2), machine("BOB"), "");

    assert!(first.is_well_formed(), "bad code {first}");
    assert!(second.is_well_formed(), "bad code {second}");
    assert_ne!(first, second);
    assert_eq!(manager.lobby_count(), 2);
    assert_consistent(&manager);
}

#[test]
fn generated_codes_never_collide_with_active_lobbies() {
    let mut manager = LobbyManager::with_seed(42);
    let mut codes = std::collections::HashSet::new();

    for id in 0..500 {
        let code = manager.create_lobby(conn(id), machine("P"), "");
        assert!(codes.insert(code), "code reused while active");
    }
    assert_eq!(manager.lobby_count(), 500);
}

#[test]
fn create_lobby_broadcasts_state_to_new_room() {
    let mut manager = LobbyManager::with_seed(1);
    let code = manager.create_lobby(conn(1), machine("ALICE"), "");

    let effects = manager.take_effects();
    assert_eq!(effects.len(), 1);
    match &effects[0] {
        Effect::Room(room, ServerEvent::LobbyState(state)) => {
            assert_eq!(room, &code);
            assert_eq!(state.code, code);
            assert_eq!(state.players.len(), 1);
            assert_eq!(state.players[0].profile_name, "ALICE");
            assert!(state.song_info.is_none());
        }
        other => panic!("unexpected effect {other:?}"),
    }
    assert!(manager.take_effects().is_empty());
}

#[test]
fn can_join_checks_code_and_password() {
    let mut manager = LobbyManager::with_seed(3);
    let public = manager.create_lobby(conn(1), machine("A"), "");
    let private = manager.create_lobby(conn(2), machine("B"), "hunter2");

    assert!(manager.can_join(&public, ""));
    assert!(manager.can_join(&public, "anything"));
    assert!(manager.can_join(&private, "hunter2"));
    assert!(!manager.can_join(&private, "wrong"));
    assert!(!manager.can_join(&private, ""));
    assert!(!manager.can_join(&LobbyCode::from("ZZZZ"), ""));

    let lowercase = LobbyCode::new(public.as_str().to_lowercase());
    assert!(!manager.can_join(&lowercase, ""), "codes are case-sensitive");
}

#[test]
fn join_lobby_adds_machine_and_broadcasts() {
    let mut manager = LobbyManager::with_seed(5);
    let code = manager.create_lobby(conn(1), machine("A"), "pw");
    manager.take_effects();

    manager
        .join_lobby(conn(2), machine("B"), &code, "pw")
        .expect("join succeeds");

    let lobby = manager.lobby(&code).unwrap();
    assert_eq!(lobby.machines.len(), 2);
    let names: Vec<_> = lobby.players().map(|p| p.profile_name.as_str()).collect();
    assert_eq!(names, ["A", "B"]);

    let effects = manager.take_effects();
    assert!(matches!(
        effects.as_slice(),
        [Effect::Room(room, ServerEvent::LobbyState(state))] if room == &code && state.players.len() == 2
    ));
    assert_consistent(&manager);
}

#[test]
fn join_lobby_rejects_bad_password_and_unknown_code_alike() {
    let mut manager = LobbyManager::with_seed(5);
    let code = manager.create_lobby(conn(1), machine("A"), "pw");

    assert_eq!(
        manager.join_lobby(conn(2), machine("B"), &code, "nope"),
        Err(LobbyError::CannotJoin)
    );
    assert_eq!(
        manager.join_lobby(conn(2), machine("B"), &LobbyCode::from("QQQQ"), "pw"),
        Err(LobbyError::CannotJoin)
    );
    assert_eq!(manager.machine_lobby(conn(2)), None);
}

#[test]
fn fifth_machine_is_rejected() {
    let mut manager = LobbyManager::with_seed(9);
    let code = manager.create_lobby(conn(1), machine("A"), "");
    for id in 2..=4 {
        manager.join_lobby(conn(id), machine("X"), &code, "").unwrap();
    }

    let result = manager.join_lobby(conn(5), machine("E"), &code, "");
    assert_eq!(result, Err(LobbyError::LobbyFull));
    assert_eq!(manager.lobby(&code).unwrap().machines.len(), 4);
    assert_eq!(manager.machine_lobby(conn(5)), None);
    assert_consistent(&manager);
}

#[test]
fn join_mid_round_is_rejected() {
    let mut manager = LobbyManager::with_seed(11);
    let code = manager.create_lobby(conn(1), machine("A"), "");
    manager.select_song(conn(1), song("WOWIE")).unwrap();

    let result = manager.join_lobby(conn(2), machine("B"), &code, "");
    assert_eq!(result, Err(LobbyError::SongAlreadySelected));
}

#[test]
fn rejoining_own_lobby_replaces_machine_in_place() {
    let mut manager = LobbyManager::with_seed(13);
    let code = manager.create_lobby(conn(1), machine("A"), "");
    manager.join_lobby(conn(2), machine("B"), &code, "").unwrap();

    manager.join_lobby(conn(1), machine("A2"), &code, "").unwrap();

    let lobby = manager.lobby(&code).unwrap();
    assert_eq!(lobby.machines.len(), 2);
    let names: Vec<_> = lobby.players().map(|p| p.profile_name.as_str()).collect();
    assert_eq!(names, ["A2", "B"]);
    assert_consistent(&manager);
}

#[test]
fn joining_another_lobby_leaves_the_previous_one() {
    let mut manager = LobbyManager::with_seed(17);
    let first = manager.create_lobby(conn(1), machine("A"), "");
    let second = manager.create_lobby(conn(2), machine("B"), "");
    manager.join_lobby(conn(3), machine("C"), &first, "").unwrap();

    manager.join_lobby(conn(3), machine("C"), &second, "").unwrap();

    assert_eq!(manager.machine_lobby(conn(3)), Some(&second));
    assert_eq!(manager.lobby(&first).unwrap().machines.len(), 1);
    assert_eq!(manager.lobby(&second).unwrap().machines.len(), 2);
    assert_consistent(&manager);
}

#[test]
fn creating_a_lobby_releases_previous_roles() {
    let mut manager = LobbyManager::with_seed(19);
    let watched = manager.create_lobby(conn(1), machine("A"), "");
    manager.spectate_lobby(conn(2), spectator("S"), &watched, "");

    let own = manager.create_lobby(conn(2), machine("S"), "");

    assert_eq!(manager.spectator_lobby(conn(2)), None);
    assert_eq!(manager.machine_lobby(conn(2)), Some(&own));
    assert!(manager.lobby(&watched).unwrap().spectators.is_empty());
    assert_consistent(&manager);
}

#[test]
fn select_song_twice_keeps_first_song() {
    let mut manager = LobbyManager::with_seed(23);
    let code = manager.create_lobby(conn(1), machine("A"), "");
    manager.join_lobby(conn(2), machine("B"), &code, "").unwrap();

    manager.select_song(conn(1), song("WOWIE")).unwrap();
    let second = manager.select_song(conn(2), song("Updated"));

    assert_eq!(second, Err(LobbyError::SongAlreadySelected));
    let stored = manager.lobby(&code).unwrap().song_info.clone().unwrap();
    assert_eq!(stored.title, "WOWIE");
}

#[test]
fn select_song_without_lobby_fails() {
    let mut manager = LobbyManager::with_seed(23);
    assert_eq!(
        manager.select_song(conn(1), song("WOWIE")),
        Err(LobbyError::LobbyNotFound)
    );
}

#[test]
fn update_machine_without_machine_fails() {
    let mut manager = LobbyManager::with_seed(29);
    assert_eq!(
        manager.update_machine(conn(1), screen("select")),
        Err(LobbyError::MachineNotFound)
    );
    assert!(manager.take_effects().is_empty());
}

#[test]
fn update_machine_merges_fields() {
    let mut manager = LobbyManager::with_seed(29);
    let code = manager.create_lobby(conn(1), machine("A"), "");

    let update = MachineUpdate {
        player1: Some(PlayerUpdate {
            ready: Some(true),
            ..PlayerUpdate::default()
        }),
        player2: Some(PlayerUpdate {
            player_id: Some("P2".to_string()),
            profile_name: Some("GUEST".to_string()),
            screen_name: Some("select".to_string()),
            ..PlayerUpdate::default()
        }),
    };
    manager.update_machine(conn(1), update).unwrap();

    let lobby = manager.lobby(&code).unwrap();
    let machine = &lobby.machines[&conn(1)];
    let p1 = machine.player1.as_ref().unwrap();
    assert!(p1.ready);
    assert_eq!(p1.profile_name, "A");
    assert_eq!(p1.screen_name, "select");
    assert_eq!(machine.player2.as_ref().unwrap().profile_name, "GUEST");
    assert_eq!(lobby.summary().machine_count, 2);
}

#[test]
fn returning_to_select_resets_round() {
    let mut manager = LobbyManager::with_seed(31);
    let code = manager.create_lobby(conn(1), machine("A"), "");
    manager.join_lobby(conn(2), machine("B"), &code, "").unwrap();
    manager.select_song(conn(1), song("WOWIE")).unwrap();

    for id in [1, 2] {
        let update = MachineUpdate {
            player1: Some(PlayerUpdate {
                screen_name: Some("gameplay".to_string()),
                score: Some(98.5),
                progress: Some(0.75),
                ready: Some(true),
                ..PlayerUpdate::default()
            }),
            player2: None,
        };
        manager.update_machine(conn(id), update).unwrap();
    }
    assert!(manager.lobby(&code).unwrap().song_info.is_some());

    // One machine back on select: round still running.
    manager.update_machine(conn(1), screen("select")).unwrap();
    let lobby = manager.lobby(&code).unwrap();
    assert!(lobby.song_info.is_some());
    assert_eq!(lobby.machines[&conn(1)].player1.as_ref().unwrap().score, Some(98.5));

    // Last machine back: song and results cleared, identity kept.
    manager.update_machine(conn(2), screen("select")).unwrap();
    let lobby = manager.lobby(&code).unwrap();
    assert!(lobby.song_info.is_none());
    for (id, name) in [(1, "A"), (2, "B")] {
        let p = lobby.machines[&conn(id)].player1.as_ref().unwrap();
        assert_eq!(p.player_id, "P1");
        assert_eq!(p.profile_name, name);
        assert_eq!(p.screen_name, "select");
        assert!(p.ready);
        assert_eq!(p.score, None);
        assert_eq!(p.progress, None);
    }

    // A new song can be picked for the next round.
    manager.select_song(conn(2), song("Updated")).unwrap();
    assert_eq!(
        manager.lobby(&code).unwrap().song_info.as_ref().unwrap().title,
        "Updated"
    );
}

#[test]
fn staying_on_select_does_not_clear_song() {
    let mut manager = LobbyManager::with_seed(37);
    let code = manager.create_lobby(conn(1), machine("A"), "");
    manager.select_song(conn(1), song("WOWIE")).unwrap();

    // Already all on select before the update: no transition.
    manager.update_machine(conn(1), screen("select")).unwrap();
    assert!(manager.lobby(&code).unwrap().song_info.is_some());
}

#[test]
fn last_player_in_a_song_leaving_resets_round() {
    let mut manager = LobbyManager::with_seed(41);
    let code = manager.create_lobby(conn(1), machine("A"), "");
    manager.join_lobby(conn(2), machine("B"), &code, "").unwrap();
    manager.select_song(conn(1), song("WOWIE")).unwrap();
    manager.update_machine(conn(1), screen("gameplay")).unwrap();
    manager.update_machine(conn(2), screen("gameplay")).unwrap();
    manager.update_machine(conn(1), screen("select")).unwrap();

    assert!(manager.disconnect_machine(conn(2)));

    let lobby = manager.lobby(&code).unwrap();
    assert!(lobby.song_info.is_none());
    manager.take_effects();
    manager.join_lobby(conn(3), machine("C"), &code, "").unwrap();
    manager.select_song(conn(1), song("Updated")).unwrap();
    assert_eq!(
        manager.lobby(&code).unwrap().song_info.as_ref().unwrap().title,
        "Updated"
    );
    assert_consistent(&manager);
}

#[test]
fn leaving_while_others_still_play_keeps_round() {
    let mut manager = LobbyManager::with_seed(43);
    let code = manager.create_lobby(conn(1), machine("A"), "");
    manager.join_lobby(conn(2), machine("B"), &code, "").unwrap();
    manager.select_song(conn(1), song("WOWIE")).unwrap();
    manager.update_machine(conn(1), screen("gameplay")).unwrap();
    manager.update_machine(conn(2), screen("gameplay")).unwrap();

    assert!(manager.leave_lobby(conn(2)));

    assert!(manager.lobby(&code).unwrap().song_info.is_some());
}

#[test]
fn rejoining_own_lobby_mid_round_is_allowed() {
    let mut manager = LobbyManager::with_seed(47);
    let code = manager.create_lobby(conn(1), machine("A"), "");
    manager.select_song(conn(1), song("WOWIE")).unwrap();

    assert_eq!(manager.join_lobby(conn(1), machine("A2"), &code, ""), Ok(()));

    let lobby = manager.lobby(&code).unwrap();
    assert_eq!(lobby.machines.len(), 1);
    assert_eq!(lobby.song_info.as_ref().unwrap().title, "WOWIE");
    assert_consistent(&manager);
}

#[test]
fn machine_cannot_spectate_its_own_lobby() {
    let mut manager = LobbyManager::with_seed(41);
    let code = manager.create_lobby(conn(1), machine("A"), "");

    let spectators = manager.spectate_lobby(conn(1), spectator("A"), &code, "");

    assert_eq!(spectators, 0);
    assert_eq!(manager.spectator_lobby(conn(1)), None);
    assert_eq!(manager.machine_lobby(conn(1)), Some(&code));
    assert_consistent(&manager);
}

#[test]
fn spectate_unknown_lobby_returns_zero() {
    let mut manager = LobbyManager::with_seed(41);
    assert_eq!(
        manager.spectate_lobby(conn(1), spectator("S"), &LobbyCode::from("NONE"), ""),
        0
    );
}

#[test]
fn spectate_counts_and_sends_state_directly() {
    let mut manager = LobbyManager::with_seed(43);
    let code = manager.create_lobby(conn(1), machine("A"), "pw");
    manager.take_effects();

    assert_eq!(manager.spectate_lobby(conn(2), spectator("S1"), &code, "bad"), 0);
    assert_eq!(manager.spectate_lobby(conn(2), spectator("S1"), &code, "pw"), 1);
    assert_eq!(manager.spectate_lobby(conn(3), spectator("S2"), &code, "pw"), 2);
    // Re-spectating the same lobby does not double count.
    assert_eq!(manager.spectate_lobby(conn(3), spectator("S2"), &code, "pw"), 2);

    let effects = manager.take_effects();
    assert!(effects
        .iter()
        .all(|e| matches!(e, Effect::Direct(_, ServerEvent::LobbyState(_)))));
    assert_eq!(effects.len(), 3);
    assert_consistent(&manager);
}

#[test]
fn spectator_switching_lobbies_moves() {
    let mut manager = LobbyManager::with_seed(47);
    let first = manager.create_lobby(conn(1), machine("A"), "");
    let second = manager.create_lobby(conn(2), machine("B"), "");

    manager.spectate_lobby(conn(3), spectator("S"), &first, "");
    manager.spectate_lobby(conn(3), spectator("S"), &second, "");

    assert_eq!(manager.spectator_lobby(conn(3)), Some(&second));
    assert!(manager.lobby(&first).unwrap().spectators.is_empty());
    assert_eq!(manager.lobby(&second).unwrap().spectators.len(), 1);
    assert_consistent(&manager);
}

#[test]
fn spectator_joining_as_machine_drops_spectator_role() {
    let mut manager = LobbyManager::with_seed(53);
    let code = manager.create_lobby(conn(1), machine("A"), "");
    manager.spectate_lobby(conn(2), spectator("S"), &code, "");

    manager.join_lobby(conn(2), machine("S"), &code, "").unwrap();

    assert_eq!(manager.spectator_lobby(conn(2)), None);
    assert_eq!(manager.machine_lobby(conn(2)), Some(&code));
    assert!(manager.lobby(&code).unwrap().spectators.is_empty());
    assert_consistent(&manager);
}

#[test]
fn search_counts_players_not_machines() {
    let mut manager = LobbyManager::with_seed(59);
    let doubles = MachineInfo {
        player1: Some(player("P1", "A", "select")),
        player2: Some(player("P2", "B", "select")),
    };
    let code = manager.create_lobby(conn(1), doubles, "secret");
    manager.spectate_lobby(conn(2), spectator("S"), &code, "secret");

    let lobbies = manager.search_lobbies();
    assert_eq!(lobbies.len(), 1);
    assert_eq!(lobbies[0].code, code);
    assert!(lobbies[0].is_password_protected);
    assert_eq!(lobbies[0].machine_count, 2);
    assert_eq!(lobbies[0].spectator_count, 1);
}

#[test]
fn leave_broadcasts_to_remaining_room() {
    let mut manager = LobbyManager::with_seed(61);
    let code = manager.create_lobby(conn(1), machine("A"), "");
    manager.join_lobby(conn(2), machine("B"), &code, "").unwrap();
    manager.take_effects();

    assert!(manager.leave_lobby(conn(2)));
    assert!(!manager.leave_lobby(conn(2)));

    let effects = manager.take_effects();
    assert!(matches!(
        effects.as_slice(),
        [Effect::Room(room, ServerEvent::LobbyState(state))] if room == &code && state.players.len() == 1
    ));
    assert!(!manager.rooms().is_joined(conn(2), &code));
    assert_consistent(&manager);
}

#[test]
fn last_machine_leaving_closes_lobby_and_disconnects_spectators() {
    let mut manager = LobbyManager::with_seed(67);
    let code = manager.create_lobby(conn(1), machine("A"), "");
    manager.spectate_lobby(conn(2), spectator("S1"), &code, "");
    manager.spectate_lobby(conn(3), spectator("S2"), &code, "");
    manager.take_effects();

    assert!(manager.disconnect_machine(conn(1)));

    assert!(manager.search_lobbies().is_empty());
    assert_eq!(manager.lobby_count(), 0);
    assert_eq!(manager.spectator_lobby(conn(2)), None);
    assert_eq!(manager.spectator_lobby(conn(3)), None);
    assert_eq!(manager.rooms().room_count(), 0);

    let mut disconnected: Vec<_> = manager
        .take_effects()
        .into_iter()
        .filter_map(|e| match e {
            Effect::Disconnect(id, reason) => {
                assert_eq!(reason.as_deref(), Some(LOBBY_CLOSED_REASON));
                Some(id)
            }
            _ => None,
        })
        .collect();
    disconnected.sort();
    assert_eq!(disconnected, [conn(2), conn(3)]);

    // The code is free again.
    assert!(!manager.can_join(&code, ""));
}

#[test]
fn player_less_machines_are_detached_when_lobby_closes() {
    let mut manager = LobbyManager::with_seed(71);
    let code = manager.create_lobby(conn(1), machine("A"), "");
    manager
        .join_lobby(conn(2), MachineInfo::default(), &code, "")
        .unwrap();
    manager.take_effects();

    manager.disconnect_machine(conn(1));

    assert_eq!(manager.lobby_count(), 0);
    assert_eq!(manager.machine_lobby(conn(2)), None);
    let effects = manager.take_effects();
    assert!(effects.contains(&Effect::Direct(conn(2), ServerEvent::lobby_left(true))));
}

#[test]
fn spectator_leaving_never_closes_lobby() {
    let mut manager = LobbyManager::with_seed(73);
    let code = manager.create_lobby(conn(1), machine("A"), "");
    manager.spectate_lobby(conn(2), spectator("S"), &code, "");

    assert!(manager.disconnect_spectator(conn(2)));
    assert!(!manager.disconnect_spectator(conn(2)));
    assert_eq!(manager.lobby_count(), 1);
    assert_consistent(&manager);
}

#[test]
fn request_state_goes_to_callers_room() {
    let mut manager = LobbyManager::with_seed(79);
    let code = manager.create_lobby(conn(1), machine("A"), "");
    manager.spectate_lobby(conn(2), spectator("S"), &code, "");
    manager.take_effects();

    manager.request_state(conn(2)).unwrap();
    assert!(matches!(
        manager.take_effects().as_slice(),
        [Effect::Room(room, ServerEvent::LobbyState(_))] if room == &code
    ));
    assert_eq!(manager.request_state(conn(9)), Err(LobbyError::LobbyNotFound));
}

#[test]
fn reset_forgets_everything() {
    let mut manager = LobbyManager::with_seed(83);
    let code = manager.create_lobby(conn(1), machine("A"), "");
    manager.spectate_lobby(conn(2), spectator("S"), &code, "");

    manager.reset();

    assert_eq!(manager.lobby_count(), 0);
    assert_eq!(manager.machine_lobby(conn(1)), None);
    assert_eq!(manager.spectator_lobby(conn(2)), None);
    assert_eq!(manager.rooms().room_count(), 0);
    assert!(manager.take_effects().is_empty());
}
