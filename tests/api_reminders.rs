//! Integration tests per gli endpoints dei promemoria
//!
//! Girano sul backend in memoria con utenti e chat di esempio (vedi `common`):
//! - alice (1), bob (2), charlie (3) nella chat di gruppo 10, admin alice
//! - dave (4) fuori da tutte le chat

mod common;

#[cfg(test)]
mod reminder_tests {
    use super::common::*;
    use axum_test::TestServer;
    use axum_test::http::{HeaderName, StatusCode};
    use chrono::{DateTime, Duration, Utc};
    use reminder_server::dtos::ReminderDTO;
    use reminder_server::entities::ReminderKind;
    use reminder_server::repositories::ReminderStore;
    use serde_json::{Value, json};

    fn due_time() -> DateTime<Utc> {
        start_time() + Duration::hours(1)
    }

    fn auth() -> HeaderName {
        HeaderName::from_static("authorization")
    }

    async fn create_group_reminder(server: &TestServer, user_id: i32, message: &str) -> ReminderDTO {
        let response = server
            .post("/reminders")
            .add_header(auth(), bearer(user_id))
            .json(&json!({
                "kind": "us",
                "chatId": TEAM_CHAT,
                "message": message,
                "dueAt": due_time(),
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    async fn create_personal_reminder(server: &TestServer, user_id: i32, message: &str) -> ReminderDTO {
        let response = server
            .post("/reminders")
            .add_header(auth(), bearer(user_id))
            .json(&json!({
                "kind": "me",
                "message": message,
                "dueAt": due_time(),
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    async fn toggle(server: &TestServer, user_id: i32, reminder_id: i32) -> ReminderDTO {
        let response = server
            .put(&format!("/reminders/{}/toggle-done", reminder_id))
            .add_header(auth(), bearer(user_id))
            .await;
        response.assert_status_ok();
        response.json()
    }

    async fn chat_list(server: &TestServer, user_id: i32, status: &str) -> Vec<ReminderDTO> {
        let response = server
            .get(&format!("/reminders/chat/{}?status={}", TEAM_CHAT, status))
            .add_header(auth(), bearer(user_id))
            .await;
        response.assert_status_ok();
        response.json()
    }

    fn ids(reminders: &[ReminderDTO]) -> Vec<i32> {
        reminders.iter().map(|r| r.id).collect()
    }

    // ============================================================
    // POST /reminders
    // ============================================================

    #[tokio::test]
    async fn test_create_group_reminder_success() {
        let ctx = create_test_context();
        let server = create_test_server(ctx.state.clone());

        let response = server
            .post("/reminders")
            .add_header(auth(), bearer(ALICE))
            .json(&json!({
                "kind": "us",
                "chatId": TEAM_CHAT,
                "title": "daily",
                "message": "standup",
                "dueAt": due_time(),
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["kind"], "us");
        assert_eq!(body["message"], "standup");
        assert_eq!(body["creator"]["username"], "alice");
        assert_eq!(body["chat"]["chatId"], TEAM_CHAT);
        assert_eq!(body["isDone"], false);
        assert_eq!(body["notificationSent"], false);
        assert_eq!(body["markedDoneBy"], json!([]));
        assert_eq!(body["remindAgainCount"], 0);

        let created: ReminderDTO = serde_json::from_value(body).unwrap();
        assert_eq!(created.created_at, start_time());
        assert_eq!(ctx.reminders.len(), 1);
    }

    #[tokio::test]
    async fn test_create_personal_reminder_drops_chat() {
        let ctx = create_test_context();
        let server = create_test_server(ctx.state.clone());

        let response = server
            .post("/reminders")
            .add_header(auth(), bearer(BOB))
            .json(&json!({
                "type": "me",
                "chatId": TEAM_CHAT,
                "message": "call mum",
                "dueAt": due_time(),
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let created: ReminderDTO = response.json();
        assert_eq!(created.kind, ReminderKind::Personal);
        assert!(created.chat.is_none());

        let stored = ctx.reminders.read(&created.id).await.unwrap().unwrap();
        assert_eq!(stored.chat_id, None);
    }

    #[tokio::test]
    async fn test_create_reminder_validation_errors() {
        let ctx = create_test_context();
        let server = create_test_server(ctx.state.clone());

        let invalid_bodies = vec![
            json!({ "kind": "me", "dueAt": due_time() }),
            json!({ "kind": "me", "message": "   ", "dueAt": due_time() }),
            json!({ "kind": "me", "message": "no date" }),
            json!({ "message": "no kind", "dueAt": due_time() }),
            json!({ "kind": "them", "message": "bad kind", "dueAt": due_time() }),
            json!({ "kind": "us", "message": "no chat", "dueAt": due_time() }),
            json!({ "kind": "me", "message": "x".repeat(2001), "dueAt": due_time() }),
        ];

        for body in invalid_bodies {
            let response = server
                .post("/reminders")
                .add_header(auth(), bearer(ALICE))
                .json(&body)
                .await;
            response.assert_status_bad_request();
        }

        let malformed = server
            .post("/reminders")
            .add_header(auth(), bearer(ALICE))
            .content_type("application/json")
            .text("{ not json")
            .await;
        malformed.assert_status_bad_request();

        assert!(ctx.reminders.is_empty(), "Nessun promemoria deve essere creato");
    }

    #[tokio::test]
    async fn test_create_group_reminder_outside_chat_is_forbidden() {
        let ctx = create_test_context();
        let server = create_test_server(ctx.state.clone());

        let response = server
            .post("/reminders")
            .add_header(auth(), bearer(DAVE))
            .json(&json!({ "kind": "us", "chatId": TEAM_CHAT, "message": "hi", "dueAt": due_time() }))
            .await;
        response.assert_status_forbidden();

        let response = server
            .post("/reminders")
            .add_header(auth(), bearer(ALICE))
            .json(&json!({ "kind": "us", "chatId": 999, "message": "hi", "dueAt": due_time() }))
            .await;
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_requests_without_valid_token_are_rejected() {
        let ctx = create_test_context();
        let server = create_test_server(ctx.state.clone());

        server.get("/reminders/user").await.assert_status_forbidden();

        server
            .get("/reminders/user")
            .add_header(auth(), "Bearer not-a-token".to_string())
            .await
            .assert_status_unauthorized();

        // token valido per un utente che la directory non conosce
        let ghost = create_test_jwt(77, "ghost", JWT_SECRET);
        server
            .get("/reminders/user")
            .add_header(auth(), format!("Bearer {}", ghost))
            .await
            .assert_status_unauthorized();
    }

    // ============================================================
    // PUT /reminders/{id}/toggle-done e /done
    // ============================================================

    #[tokio::test]
    async fn test_group_is_done_when_every_participant_toggles() {
        let ctx = create_test_context();
        let server = create_test_server(ctx.state.clone());
        let reminder = create_group_reminder(&server, ALICE, "standup").await;

        let after_alice = toggle(&server, ALICE, reminder.id).await;
        assert!(!after_alice.is_done);
        assert_eq!(after_alice.marked_done_by, vec![ALICE]);

        toggle(&server, BOB, reminder.id).await;
        let after_charlie = toggle(&server, CHARLIE, reminder.id).await;
        assert!(after_charlie.is_done);
        assert_eq!(after_charlie.marked_done_by, vec![ALICE, BOB, CHARLIE]);

        // un partecipante toglie il segno: il promemoria torna aperto
        let after_undo = toggle(&server, BOB, reminder.id).await;
        assert!(!after_undo.is_done);
        assert_eq!(after_undo.marked_done_by, vec![ALICE, CHARLIE]);
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_state() {
        let ctx = create_test_context();
        let server = create_test_server(ctx.state.clone());
        let reminder = create_personal_reminder(&server, ALICE, "water plants").await;

        let once = toggle(&server, ALICE, reminder.id).await;
        assert!(once.is_done);
        let twice = toggle(&server, ALICE, reminder.id).await;
        assert!(!twice.is_done);
        assert!(twice.marked_done_by.is_empty());
    }

    #[tokio::test]
    async fn test_personal_toggle_by_someone_else_is_forbidden() {
        let ctx = create_test_context();
        let server = create_test_server(ctx.state.clone());
        let reminder = create_personal_reminder(&server, ALICE, "private").await;

        server
            .put(&format!("/reminders/{}/toggle-done", reminder.id))
            .add_header(auth(), bearer(BOB))
            .await
            .assert_status_forbidden();
        server
            .put(&format!("/reminders/{}/done", reminder.id))
            .add_header(auth(), bearer(BOB))
            .await
            .assert_status_forbidden();

        let stored = ctx.reminders.read(&reminder.id).await.unwrap().unwrap();
        assert!(stored.marked_done_by.is_empty());
        assert_eq!(stored.done_by, None);
    }

    #[tokio::test]
    async fn test_group_mark_by_non_participant_is_forbidden() {
        let ctx = create_test_context();
        let server = create_test_server(ctx.state.clone());
        let reminder = create_group_reminder(&server, ALICE, "standup").await;

        toggle(&server, ALICE, reminder.id).await;
        toggle(&server, BOB, reminder.id).await;

        // dave non è nella chat: il suo segno non può chiudere il promemoria al posto di charlie
        server
            .put(&format!("/reminders/{}/toggle-done", reminder.id))
            .add_header(auth(), bearer(DAVE))
            .await
            .assert_status_forbidden();
        server
            .put(&format!("/reminders/{}/done", reminder.id))
            .add_header(auth(), bearer(DAVE))
            .await
            .assert_status_forbidden();

        let stored = ctx.reminders.read(&reminder.id).await.unwrap().unwrap();
        assert_eq!(stored.marked_done_by.into_iter().collect::<Vec<_>>(), vec![ALICE, BOB]);
        assert_eq!(stored.done_by, None);
    }

    #[tokio::test]
    async fn test_legacy_done_is_cleared_by_toggle() {
        let ctx = create_test_context();
        let server = create_test_server(ctx.state.clone());
        let reminder = create_group_reminder(&server, ALICE, "retro").await;

        let response = server
            .put(&format!("/reminders/{}/done", reminder.id))
            .add_header(auth(), bearer(BOB))
            .await;
        response.assert_status_ok();
        let done: ReminderDTO = response.json();
        assert!(done.is_done);
        assert_eq!(done.done_by, Some(BOB));
        assert!(done.marked_done_by.is_empty());

        let toggled = toggle(&server, CHARLIE, reminder.id).await;
        assert_eq!(toggled.done_by, None);
        assert!(!toggled.is_done);
    }

    // ============================================================
    // PUT /reminders/{id}/reschedule e /snooze
    // ============================================================

    #[tokio::test]
    async fn test_group_reschedule_is_a_personal_snooze() {
        let ctx = create_test_context();
        let server = create_test_server(ctx.state.clone());
        let reminder = create_group_reminder(&server, ALICE, "standup").await;
        let until = due_time() + Duration::hours(1);

        let response = server
            .put(&format!("/reminders/{}/reschedule", reminder.id))
            .add_header(auth(), bearer(BOB))
            .json(&json!({ "dueAt": until }))
            .await;
        response.assert_status_ok();
        let snoozed: ReminderDTO = response.json();
        assert_eq!(snoozed.due_at, due_time(), "La scadenza condivisa non cambia");
        assert_eq!(snoozed.snoozed_by.len(), 1);
        assert_eq!(snoozed.snoozed_by[0].user_id, BOB);
        assert_eq!(snoozed.snoozed_by[0].until, until);
        assert_eq!(snoozed.remind_again_count, 1);

        assert!(chat_list(&server, BOB, "active").await.is_empty());
        assert_eq!(ids(&chat_list(&server, ALICE, "active").await), vec![reminder.id]);
        assert_eq!(ids(&chat_list(&server, CHARLIE, "active").await), vec![reminder.id]);

        // passato lo snooze torna attivo anche per bob
        ctx.clock.set(until + Duration::seconds(1));
        assert_eq!(ids(&chat_list(&server, BOB, "active").await), vec![reminder.id]);
    }

    #[tokio::test]
    async fn test_snooze_endpoint_requires_participation() {
        let ctx = create_test_context();
        let server = create_test_server(ctx.state.clone());
        let group = create_group_reminder(&server, ALICE, "standup").await;
        let personal = create_personal_reminder(&server, ALICE, "dentist").await;
        let until = due_time() + Duration::minutes(30);

        server
            .put(&format!("/reminders/{}/snooze", group.id))
            .add_header(auth(), bearer(DAVE))
            .json(&json!({ "until": until }))
            .await
            .assert_status_forbidden();

        server
            .put(&format!("/reminders/{}/snooze", personal.id))
            .add_header(auth(), bearer(ALICE))
            .json(&json!({ "until": until }))
            .await
            .assert_status_forbidden();

        let response = server
            .put(&format!("/reminders/{}/snooze", group.id))
            .add_header(auth(), bearer(CHARLIE))
            .json(&json!({ "until": until }))
            .await;
        response.assert_status_ok();
        let snoozed: ReminderDTO = response.json();
        assert_eq!(snoozed.snoozed_by[0].user_id, CHARLIE);
    }

    #[tokio::test]
    async fn test_personal_reschedule_moves_due_and_reopens() {
        let ctx = create_test_context();
        let server = create_test_server(ctx.state.clone());
        let reminder = create_personal_reminder(&server, ALICE, "gym").await;
        toggle(&server, ALICE, reminder.id).await;

        let new_due = due_time() + Duration::days(1);
        let response = server
            .put(&format!("/reminders/{}/reschedule", reminder.id))
            .add_header(auth(), bearer(ALICE))
            .json(&json!({ "dueAt": new_due }))
            .await;
        response.assert_status_ok();
        let moved: ReminderDTO = response.json();
        assert_eq!(moved.due_at, new_due);
        assert!(!moved.is_done);
        assert!(moved.marked_done_by.is_empty());
        assert_eq!(moved.remind_again_count, 1);

        server
            .put(&format!("/reminders/{}/reschedule", reminder.id))
            .add_header(auth(), bearer(BOB))
            .json(&json!({ "dueAt": new_due }))
            .await
            .assert_status_forbidden();

        server
            .put(&format!("/reminders/{}/reschedule", reminder.id))
            .add_header(auth(), bearer(ALICE))
            .json(&json!({}))
            .await
            .assert_status_bad_request();
    }

    // ============================================================
    // DELETE /reminders/{id}
    // ============================================================

    #[tokio::test]
    async fn test_only_group_admin_can_delete() {
        let ctx = create_test_context();
        let server = create_test_server(ctx.state.clone());
        let reminder = create_group_reminder(&server, BOB, "standup").await;

        // bob è il creatore ma non l'admin della chat
        server
            .delete(&format!("/reminders/{}", reminder.id))
            .add_header(auth(), bearer(BOB))
            .await
            .assert_status_forbidden();
        assert!(ctx.reminders.read(&reminder.id).await.unwrap().is_some());

        server
            .delete(&format!("/reminders/{}", reminder.id))
            .add_header(auth(), bearer(ALICE))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        assert!(ctx.reminders.read(&reminder.id).await.unwrap().is_none());

        server
            .delete(&format!("/reminders/{}", reminder.id))
            .add_header(auth(), bearer(ALICE))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_group_delete_when_chat_is_gone_is_forbidden() {
        let ctx = create_test_context();
        let server = create_test_server(ctx.state.clone());
        let reminder = create_group_reminder(&server, ALICE, "standup").await;
        ctx.chats.remove(&TEAM_CHAT);

        server
            .delete(&format!("/reminders/{}", reminder.id))
            .add_header(auth(), bearer(ALICE))
            .await
            .assert_status_forbidden();
        assert!(ctx.reminders.read(&reminder.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unknown_reminder_is_not_found() {
        let ctx = create_test_context();
        let server = create_test_server(ctx.state.clone());

        for path in ["/reminders/404/done", "/reminders/404/toggle-done", "/reminders/404/mark-sent"] {
            server
                .put(path)
                .add_header(auth(), bearer(ALICE))
                .await
                .assert_status_not_found();
        }
        server
            .put("/reminders/404/reschedule")
            .add_header(auth(), bearer(ALICE))
            .json(&json!({ "dueAt": due_time() }))
            .await
            .assert_status_not_found();
        server
            .delete("/reminders/404")
            .add_header(auth(), bearer(ALICE))
            .await
            .assert_status_not_found();
    }

    // ============================================================
    // Letture
    // ============================================================

    #[tokio::test]
    async fn test_user_list_is_scoped_and_ordered_by_due() {
        let ctx = create_test_context();
        let server = create_test_server(ctx.state.clone());

        let late = server
            .post("/reminders")
            .add_header(auth(), bearer(ALICE))
            .json(&json!({ "kind": "me", "message": "late", "dueAt": due_time() + Duration::hours(5) }))
            .await
            .json::<ReminderDTO>();
        let group = create_group_reminder(&server, BOB, "standup").await;
        let bob_private = create_personal_reminder(&server, BOB, "bob only").await;

        let response = server
            .get("/reminders/user")
            .add_header(auth(), bearer(ALICE))
            .await;
        response.assert_status_ok();
        let listed: Vec<ReminderDTO> = response.json();
        assert_eq!(ids(&listed), vec![group.id, late.id]);
        assert!(!ids(&listed).contains(&bob_private.id));

        let dave: Vec<ReminderDTO> = server
            .get("/reminders/user")
            .add_header(auth(), bearer(DAVE))
            .await
            .json();
        assert!(dave.is_empty());
    }

    #[tokio::test]
    async fn test_public_list_only_has_group_reminders() {
        let ctx = create_test_context();
        let server = create_test_server(ctx.state.clone());
        let group = create_group_reminder(&server, ALICE, "standup").await;
        create_personal_reminder(&server, ALICE, "mine").await;

        let listed: Vec<ReminderDTO> = server
            .get("/reminders/public")
            .add_header(auth(), bearer(CHARLIE))
            .await
            .json();
        assert_eq!(ids(&listed), vec![group.id]);
    }

    #[tokio::test]
    async fn test_chat_list_done_partition_is_per_viewer() {
        let ctx = create_test_context();
        let server = create_test_server(ctx.state.clone());
        let first = create_group_reminder(&server, ALICE, "first").await;
        let second = create_group_reminder(&server, ALICE, "second").await;
        toggle(&server, BOB, first.id).await;

        assert_eq!(ids(&chat_list(&server, BOB, "done").await), vec![first.id]);
        assert_eq!(ids(&chat_list(&server, BOB, "active").await), vec![second.id]);
        assert!(chat_list(&server, ALICE, "done").await.is_empty());

        // senza parametro vale "active"
        let default: Vec<ReminderDTO> = server
            .get(&format!("/reminders/chat/{}", TEAM_CHAT))
            .add_header(auth(), bearer(ALICE))
            .await
            .json();
        assert_eq!(ids(&default), vec![first.id, second.id]);

        // uno stato sconosciuto vale "active"
        assert_eq!(ids(&chat_list(&server, BOB, "archived").await), vec![second.id]);
    }

    #[tokio::test]
    async fn test_chat_list_requires_membership() {
        let ctx = create_test_context();
        let server = create_test_server(ctx.state.clone());

        server
            .get(&format!("/reminders/chat/{}", TEAM_CHAT))
            .add_header(auth(), bearer(DAVE))
            .await
            .assert_status_forbidden();
        server
            .get("/reminders/chat/999")
            .add_header(auth(), bearer(ALICE))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_sidebar_lists_open_then_done_newest_first() {
        let ctx = create_test_context();
        let server = create_test_server(ctx.state.clone());

        let oldest = create_personal_reminder(&server, ALICE, "oldest").await;
        ctx.clock.advance(Duration::minutes(1));
        let middle = create_personal_reminder(&server, ALICE, "middle").await;
        ctx.clock.advance(Duration::minutes(1));
        let newest = create_personal_reminder(&server, ALICE, "newest").await;
        toggle(&server, ALICE, newest.id).await;

        let listed: Vec<ReminderDTO> = server
            .get("/reminders/sidebar")
            .add_header(auth(), bearer(ALICE))
            .await
            .json();
        assert_eq!(ids(&listed), vec![middle.id, oldest.id, newest.id]);
        assert!(listed[2].is_done);
    }

    // ============================================================
    // PUT /reminders/{id}/mark-sent
    // ============================================================

    #[tokio::test]
    async fn test_mark_sent_is_limited_to_the_audience() {
        let ctx = create_test_context();
        let server = create_test_server(ctx.state.clone());
        let reminder = create_group_reminder(&server, ALICE, "standup").await;

        server
            .put(&format!("/reminders/{}/mark-sent", reminder.id))
            .add_header(auth(), bearer(DAVE))
            .await
            .assert_status_forbidden();

        for _ in 0..2 {
            let response = server
                .put(&format!("/reminders/{}/mark-sent", reminder.id))
                .add_header(auth(), bearer(CHARLIE))
                .await;
            response.assert_status_ok();
            let sent: ReminderDTO = response.json();
            assert!(sent.notification_sent);
        }
    }
}
