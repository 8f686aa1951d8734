use async_trait::async_trait;
use huddle_core::{
    Agent, AgentStatus, CamelImport, ConnectionState, DiscussionOutcome, DiscussionRequest,
    GatewayStatus, HuddleConfig, HuddleError, HuddleResult, Meeting, MeetingGateway, MeetingRoom,
    MeetingStatus, MeetingType, Message, MessageType, NewMeeting, OutgoingMessage,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Default)]
struct MockState {
    meetings: Vec<Meeting>,
    messages: HashMap<String, Vec<Message>>,
    agents: Vec<Agent>,
    next_id: u32,
    fail: bool,
    discuss_fails: bool,
}

/// In-memory meeting server with a call log, per-call gates and failure
/// injection.
#[derive(Default)]
struct MockGateway {
    state: Mutex<MockState>,
    calls: Mutex<Vec<String>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl MockGateway {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn calls_since(&self, mark: usize) -> Vec<String> {
        self.calls.lock().unwrap()[mark..].to_vec()
    }

    fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    fn set_fail(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }

    fn set_discuss_fails(&self, fail: bool) {
        self.state.lock().unwrap().discuss_fails = fail;
    }

    fn check_fail(&self) -> HuddleResult<()> {
        if self.state.lock().unwrap().fail {
            return Err(HuddleError::GatewayUnreachable(
                "connection refused".to_string(),
            ));
        }
        Ok(())
    }

    /// Holds the next call named `call` until the returned gate is notified.
    fn gate(&self, call: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(call.to_string(), gate.clone());
        gate
    }

    async fn pass_gate(&self, call: &str) {
        let gate = self.gates.lock().unwrap().remove(call);
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn seed_meeting(&self, id: &str, status: MeetingStatus, messages: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.meetings.push(meeting(id, &format!("Meeting {}", id), status));
        state.messages.insert(
            id.to_string(),
            messages
                .iter()
                .enumerate()
                .map(|(i, content)| message(&format!("{}-{}", id, i), "user", content))
                .collect(),
        );
    }

    fn push_message(&self, meeting_id: &str, agent_id: &str, content: &str) {
        let mut state = self.state.lock().unwrap();
        let list = state.messages.entry(meeting_id.to_string()).or_default();
        let id = format!("{}-{}", meeting_id, list.len());
        list.push(message(&id, agent_id, content));
    }

    fn remote_status(&self, meeting_id: &str) -> Option<MeetingStatus> {
        let state = self.state.lock().unwrap();
        state
            .meetings
            .iter()
            .find(|m| m.id == meeting_id)
            .map(|m| m.status)
    }

    fn set_remote_status(&self, meeting_id: &str, status: MeetingStatus) -> HuddleResult<Meeting> {
        let mut state = self.state.lock().unwrap();
        let meeting = state
            .meetings
            .iter_mut()
            .find(|m| m.id == meeting_id)
            .ok_or_else(|| not_found(meeting_id))?;
        meeting.status = status;
        Ok(meeting.clone())
    }
}

fn not_found(meeting_id: &str) -> HuddleError {
    HuddleError::GatewayRejected {
        status: 404,
        message: format!("Meeting {} not found", meeting_id),
    }
}

fn meeting(id: &str, title: &str, status: MeetingStatus) -> Meeting {
    Meeting {
        id: id.to_string(),
        title: title.to_string(),
        agenda: String::new(),
        meeting_type: MeetingType::Standup,
        status,
        invited_agents: Vec::new(),
        created_at: None,
        started_at: None,
        ended_at: None,
        action_items: Vec::new(),
        camel_session_id: None,
    }
}

fn message(id: &str, agent_id: &str, content: &str) -> Message {
    Message {
        id: id.to_string(),
        meeting_id: None,
        agent_id: agent_id.to_string(),
        agent_name: agent_id.to_string(),
        content: content.to_string(),
        message_type: if agent_id == "system" {
            MessageType::System
        } else {
            MessageType::Chat
        },
        timestamp: None,
    }
}

#[async_trait]
impl MeetingGateway for MockGateway {
    async fn status(&self) -> HuddleResult<GatewayStatus> {
        self.record("status".to_string());
        self.check_fail()?;
        Ok(GatewayStatus {
            status: Some("online".to_string()),
            service: Some("mock".to_string()),
            ..GatewayStatus::default()
        })
    }

    async fn list_meetings(&self) -> HuddleResult<Vec<Meeting>> {
        self.record("list_meetings".to_string());
        self.check_fail()?;
        Ok(self.state.lock().unwrap().meetings.clone())
    }

    async fn list_agents(&self, show_hidden: bool) -> HuddleResult<Vec<Agent>> {
        self.record(format!("list_agents:{}", show_hidden));
        self.check_fail()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .agents
            .iter()
            .filter(|a| show_hidden || a.status != AgentStatus::Hidden)
            .cloned()
            .collect())
    }

    async fn get_meeting(&self, meeting_id: &str) -> HuddleResult<Meeting> {
        self.record(format!("get_meeting:{}", meeting_id));
        self.check_fail()?;
        let state = self.state.lock().unwrap();
        state
            .meetings
            .iter()
            .find(|m| m.id == meeting_id)
            .cloned()
            .ok_or_else(|| not_found(meeting_id))
    }

    async fn create_meeting(&self, request: &NewMeeting) -> HuddleResult<Meeting> {
        self.record(format!("create_meeting:{}", request.title));
        self.check_fail()?;

        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("m{}", state.next_id);

        let mut created = meeting(&id, &request.title, MeetingStatus::Draft);
        created.agenda = request.agenda.clone();
        created.meeting_type = request.meeting_type;
        created.invited_agents = request.invite_agents.clone();

        state.meetings.push(created.clone());
        state.messages.insert(
            id.clone(),
            vec![message(
                &format!("{}-0", id),
                "system",
                &format!("Meeting \"{}\" created.", request.title),
            )],
        );
        Ok(created)
    }

    async fn import_camel_session(&self, request: &CamelImport) -> HuddleResult<Meeting> {
        self.record("import_camel".to_string());
        self.check_fail()?;

        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("m{}", state.next_id);
        let mut imported = meeting(
            &id,
            &format!("CAMEL: {} & {}", request.role1, request.role2),
            MeetingStatus::InProgress,
        );
        imported.agenda = request.task.clone();
        imported.camel_session_id = request.session_id.map(|s| s.into());

        state.meetings.push(imported.clone());
        state.messages.insert(id, Vec::new());
        Ok(imported)
    }

    // Reads the list when the request arrives, like a server would; a gated
    // call answers with that older list once released.
    async fn get_messages(&self, meeting_id: &str) -> HuddleResult<Vec<Message>> {
        let call = format!("get_messages:{}", meeting_id);
        self.record(call.clone());
        let messages = self
            .state
            .lock()
            .unwrap()
            .messages
            .get(meeting_id)
            .cloned()
            .unwrap_or_default();
        self.pass_gate(&call).await;
        self.check_fail()?;
        Ok(messages)
    }

    async fn start_meeting(&self, meeting_id: &str) -> HuddleResult<Option<Meeting>> {
        let call = format!("start:{}", meeting_id);
        self.record(call.clone());
        self.pass_gate(&call).await;
        self.check_fail()?;

        if self.remote_status(meeting_id) == Some(MeetingStatus::Ended) {
            return Err(HuddleError::GatewayRejected {
                status: 400,
                message: "Meeting already ended".to_string(),
            });
        }
        let already_started = self.remote_status(meeting_id) == Some(MeetingStatus::InProgress);
        let started = self.set_remote_status(meeting_id, MeetingStatus::InProgress)?;
        if !already_started {
            self.push_message(meeting_id, "system", "Meeting started.");
            self.push_message(meeting_id, "devika", "Good morning, team.");
        }
        Ok(Some(started))
    }

    async fn end_meeting(&self, meeting_id: &str) -> HuddleResult<Option<Meeting>> {
        self.record(format!("end:{}", meeting_id));
        self.check_fail()?;
        self.set_remote_status(meeting_id, MeetingStatus::Ended)?;
        Ok(None)
    }

    async fn post_message(&self, meeting_id: &str, message: &OutgoingMessage) -> HuddleResult<()> {
        self.record(format!("post_message:{}", meeting_id));
        self.check_fail()?;
        self.push_message(meeting_id, &message.agent_id, &message.content);
        Ok(())
    }

    async fn agent_discuss(
        &self,
        meeting_id: &str,
        request: &DiscussionRequest,
    ) -> HuddleResult<DiscussionOutcome> {
        let call = format!("agent_discuss:{}", meeting_id);
        self.record(format!("{}:{}", call, request.topic));
        self.pass_gate(&call).await;
        self.check_fail()?;

        self.push_message(meeting_id, "devika", &format!("On {}: let's split it.", request.topic));
        if self.state.lock().unwrap().discuss_fails {
            return Err(HuddleError::GatewayTimeout("agents took too long".to_string()));
        }
        self.push_message(meeting_id, "pauli", "Agreed.");
        Ok(DiscussionOutcome {
            count: 2,
            responses: Vec::new(),
        })
    }
}

fn room_with(gateway: &Arc<MockGateway>) -> Arc<MeetingRoom> {
    Arc::new(MeetingRoom::new(gateway.clone(), &HuddleConfig::default()))
}

async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
    tokio::task::yield_now().await;
}

async fn wait_for_call(gateway: &MockGateway, prefix: &str) {
    for _ in 0..100 {
        if gateway.calls().iter().any(|c| c.starts_with(prefix)) {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("call '{}' never happened; calls: {:?}", prefix, gateway.calls());
}

fn contents(room: &MeetingRoom) -> Vec<String> {
    room.snapshot()
        .messages
        .into_iter()
        .map(|m| m.content)
        .collect()
}

mod lifecycle_flow {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_blank_title_makes_no_remote_call() {
        let gateway = MockGateway::new();
        let room = room_with(&gateway);

        let err = room
            .create_meeting(NewMeeting::new("   ", "plan week", MeetingType::Standup))
            .await
            .unwrap_err();

        assert!(matches!(err, HuddleError::EmptyTitle));
        assert!(err.is_validation_error());
        assert!(gateway.calls().is_empty());
        assert!(room.snapshot().meetings.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sprint_scenario() {
        let gateway = MockGateway::new();
        let room = room_with(&gateway);

        let created = room
            .create_meeting(NewMeeting::new(
                "Sprint 12",
                "plan week",
                MeetingType::SprintPlanning,
            ))
            .await
            .unwrap();
        assert_eq!(created.status, MeetingStatus::Draft);
        assert_eq!(created.meeting_type, MeetingType::SprintPlanning);

        let snapshot = room.snapshot();
        assert_eq!(snapshot.active_meeting_id(), Some(created.id.as_str()));
        assert_eq!(snapshot.meetings.len(), 1);

        let mark = gateway.calls().len();
        let started = room.start_meeting(&created.id).await.unwrap();
        assert_eq!(started.status, MeetingStatus::InProgress);

        let after_start = gateway.calls_since(mark);
        let start_at = after_start
            .iter()
            .position(|c| *c == format!("start:{}", created.id))
            .unwrap();
        let reload_at = after_start
            .iter()
            .position(|c| *c == format!("get_messages:{}", created.id))
            .unwrap();
        assert!(start_at < reload_at, "reload must follow start: {:?}", after_start);
        assert!(after_start.contains(&"list_meetings".to_string()));
        assert!(contents(&room).contains(&"Good morning, team.".to_string()));

        room.end_meeting(&created.id).await.unwrap();

        let snapshot = room.snapshot();
        assert!(snapshot.active_meeting.is_none());
        assert!(snapshot.messages.is_empty());
        let listed = snapshot.find_meeting(&created.id).unwrap();
        assert_eq!(listed.status, MeetingStatus::Ended);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let gateway = MockGateway::new();
        let room = room_with(&gateway);
        let created = room
            .create_meeting(NewMeeting::new("Daily", "", MeetingType::Standup))
            .await
            .unwrap();

        room.start_meeting(&created.id).await.unwrap();
        let first = room.snapshot();
        let again = room.start_meeting(&created.id).await.unwrap();
        let second = room.snapshot();

        assert_eq!(again.status, MeetingStatus::InProgress);
        assert_eq!(gateway.count(&format!("start:{}", created.id)), 2);
        assert_eq!(first.active_meeting, second.active_meeting);
        assert_eq!(second.meetings.len(), 1);
        assert_eq!(first.messages, second.messages);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_requires_matching_active_meeting() {
        let gateway = MockGateway::new();
        gateway.seed_meeting("a", MeetingStatus::Draft, &[]);
        gateway.seed_meeting("b", MeetingStatus::Draft, &[]);
        let room = room_with(&gateway);

        let err = room.start_meeting("a").await.unwrap_err();
        assert!(matches!(err, HuddleError::NoActiveMeeting));

        room.refresh_meetings().await.unwrap();
        room.select_meeting_by_id("b").await.unwrap();
        let err = room.start_meeting("a").await.unwrap_err();
        assert!(matches!(err, HuddleError::MeetingNotActive { .. }));
        assert_eq!(gateway.count("start:a"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_returns_started_meeting_after_switch() {
        let gateway = MockGateway::new();
        gateway.seed_meeting("a", MeetingStatus::Draft, &[]);
        gateway.seed_meeting("b", MeetingStatus::Draft, &["b one"]);
        let room = room_with(&gateway);
        room.refresh_meetings().await.unwrap();
        room.select_meeting_by_id("a").await.unwrap();

        let gate = gateway.gate("start:a");
        let starting = {
            let room = room.clone();
            tokio::spawn(async move { room.start_meeting("a").await })
        };
        wait_for_call(&gateway, "start:a").await;

        room.select_meeting_by_id("b").await.unwrap();
        gate.notify_one();
        let started = starting.await.unwrap().unwrap();

        assert_eq!(started.id, "a");
        assert_eq!(started.status, MeetingStatus::InProgress);

        let snapshot = room.snapshot();
        let active = snapshot.active_meeting.clone().unwrap();
        assert_eq!(active.id, "b");
        assert_eq!(active.status, MeetingStatus::Draft);
        assert_eq!(
            snapshot.find_meeting("a").unwrap().status,
            MeetingStatus::InProgress
        );
        assert_eq!(contents(&room), ["b one"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ended_meeting_cannot_start() {
        let gateway = MockGateway::new();
        gateway.seed_meeting("old", MeetingStatus::Ended, &["bye"]);
        let room = room_with(&gateway);

        room.select_meeting_by_id("old").await.unwrap();
        let err = room.start_meeting("old").await.unwrap_err();

        assert!(matches!(err, HuddleError::InvalidTransition { .. }));
        assert_eq!(gateway.count("start:old"), 0);
        assert_eq!(
            room.snapshot().active_meeting.unwrap().status,
            MeetingStatus::Ended
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_twice_keeps_state() {
        let gateway = MockGateway::new();
        gateway.seed_meeting("a", MeetingStatus::InProgress, &["hi"]);
        let room = room_with(&gateway);
        room.refresh_meetings().await.unwrap();
        room.select_meeting_by_id("a").await.unwrap();

        room.end_meeting("a").await.unwrap();
        room.end_meeting("a").await.unwrap();

        let snapshot = room.snapshot();
        assert!(snapshot.active_meeting.is_none());
        assert_eq!(snapshot.meetings.len(), 1);
        assert_eq!(snapshot.meetings[0].status, MeetingStatus::Ended);
    }

    #[tokio::test(start_paused = true)]
    async fn test_import_camel_selects_meeting() {
        let gateway = MockGateway::new();
        let room = room_with(&gateway);

        let meeting = room
            .import_camel(CamelImport {
                session_id: Some(7),
                role1: "Architect".to_string(),
                role2: "Engineer".to_string(),
                task: "Design the cache".to_string(),
            })
            .await
            .unwrap();

        let snapshot = room.snapshot();
        assert_eq!(snapshot.active_meeting_id(), Some(meeting.id.as_str()));
        assert_eq!(snapshot.meetings.len(), 1);
        assert!(gateway.calls().contains(&format!("get_messages:{}", meeting.id)));
    }
}

mod polling_flow {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_end_cancels_polling() {
        let gateway = MockGateway::new();
        let room = room_with(&gateway);
        let created = room
            .create_meeting(NewMeeting::new("Daily", "", MeetingType::Standup))
            .await
            .unwrap();
        room.start_meeting(&created.id).await.unwrap();

        let poll = format!("get_messages:{}", created.id);
        let before = gateway.count(&poll);
        advance(Duration::from_millis(2100)).await;
        assert_eq!(gateway.count(&poll), before + 1);

        room.end_meeting(&created.id).await.unwrap();
        let after_end = gateway.count(&poll);

        advance(Duration::from_secs(20)).await;
        assert_eq!(gateway.count(&poll), after_end);
        assert!(!room.session().poller().is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_picks_up_remote_messages() {
        let gateway = MockGateway::new();
        gateway.seed_meeting("a", MeetingStatus::InProgress, &["first"]);
        let room = room_with(&gateway);
        room.select_meeting_by_id("a").await.unwrap();
        assert_eq!(contents(&room), ["first"]);

        gateway.push_message("a", "devika", "from an agent");
        advance(Duration::from_millis(2100)).await;

        assert_eq!(contents(&room), ["first", "from an agent"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_failure_keeps_messages() {
        let gateway = MockGateway::new();
        gateway.seed_meeting("a", MeetingStatus::InProgress, &["one", "two"]);
        let room = room_with(&gateway);
        room.select_meeting_by_id("a").await.unwrap();

        gateway.set_fail(true);
        advance(Duration::from_secs(5)).await;
        assert_eq!(contents(&room), ["one", "two"]);
        assert!(gateway.count("get_messages:a") >= 3);
        assert!(room.session().poller().is_running());

        gateway.set_fail(false);
        gateway.push_message("a", "pauli", "three");
        advance(Duration::from_secs(2)).await;
        assert_eq!(contents(&room), ["one", "two", "three"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_never_mixes_messages() {
        let gateway = MockGateway::new();
        gateway.seed_meeting("a", MeetingStatus::InProgress, &["a one", "a two"]);
        gateway.seed_meeting("b", MeetingStatus::InProgress, &["b one"]);
        let room = room_with(&gateway);
        room.refresh_meetings().await.unwrap();

        let mut rx = room.subscribe();
        let violations = Arc::new(Mutex::new(Vec::new()));
        let observer = {
            let violations = violations.clone();
            tokio::spawn(async move {
                while rx.changed().await.is_ok() {
                    let snapshot = rx.borrow_and_update().clone();
                    let active = snapshot.active_meeting_id().unwrap_or("").to_string();
                    for m in &snapshot.messages {
                        if active.is_empty() || !m.id.starts_with(&format!("{}-", active)) {
                            violations
                                .lock()
                                .unwrap()
                                .push(format!("{} shown while {} active", m.id, active));
                        }
                    }
                }
            })
        };

        room.select_meeting_by_id("a").await.unwrap();
        tokio::task::yield_now().await;
        assert_eq!(contents(&room), ["a one", "a two"]);

        room.select_meeting_by_id("b").await.unwrap();
        tokio::task::yield_now().await;
        assert_eq!(contents(&room), ["b one"]);

        advance(Duration::from_secs(5)).await;
        assert_eq!(contents(&room), ["b one"]);
        assert_eq!(gateway.count("get_messages:a"), 1);

        observer.abort();
        assert!(violations.lock().unwrap().is_empty(), "{:?}", violations);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_for_abandoned_meeting_is_discarded() {
        let gateway = MockGateway::new();
        gateway.seed_meeting("a", MeetingStatus::InProgress, &["from a"]);
        gateway.seed_meeting("b", MeetingStatus::InProgress, &["from b"]);
        let room = room_with(&gateway);
        room.refresh_meetings().await.unwrap();

        let gate = gateway.gate("get_messages:a");
        let pending = {
            let session = room.session().clone();
            tokio::spawn(async move { session.select_meeting_by_id("a").await })
        };
        wait_for_call(&gateway, "get_messages:a").await;
        assert_eq!(room.snapshot().active_meeting_id(), Some("a"));

        room.select_meeting_by_id("b").await.unwrap();
        assert_eq!(contents(&room), ["from b"]);

        gate.notify_one();
        pending.await.unwrap().unwrap();

        let snapshot = room.snapshot();
        assert_eq!(snapshot.active_meeting_id(), Some("b"));
        assert_eq!(contents(&room), ["from b"]);
        assert_eq!(room.session().poller().current_target().as_deref(), Some("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_during_inflight_poll_does_not_resurrect_messages() {
        let gateway = MockGateway::new();
        gateway.seed_meeting("a", MeetingStatus::InProgress, &["hello"]);
        let room = room_with(&gateway);
        room.refresh_meetings().await.unwrap();
        room.select_meeting_by_id("a").await.unwrap();

        let gate = gateway.gate("get_messages:a");
        let reload = {
            let session = room.session().clone();
            tokio::spawn(async move { session.reload_messages("a").await })
        };
        wait_for_call(&gateway, "get_messages:a").await;

        room.end_meeting("a").await.unwrap();
        gate.notify_one();

        let applied = reload.await.unwrap().unwrap();
        assert!(!applied);
        let snapshot = room.snapshot();
        assert!(snapshot.active_meeting.is_none());
        assert!(snapshot.messages.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_older_poll_never_hides_sent_message() {
        let gateway = MockGateway::new();
        gateway.seed_meeting("a", MeetingStatus::InProgress, &[]);
        let room = room_with(&gateway);
        room.refresh_meetings().await.unwrap();
        room.select_meeting_by_id("a").await.unwrap();

        // The tick's fetch reads the empty list, then hangs.
        let gate = gateway.gate("get_messages:a");
        advance(Duration::from_millis(2100)).await;
        assert_eq!(gateway.count("get_messages:a"), 2);

        room.send_message("a", "user", "hello").await.unwrap();
        assert_eq!(contents(&room), ["hello"]);

        gate.notify_one();
        advance(Duration::from_millis(10)).await;

        assert_eq!(contents(&room), ["hello"]);
        assert_eq!(gateway.count("get_messages:a"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_older_poll_never_hides_opening_messages() {
        let gateway = MockGateway::new();
        gateway.seed_meeting("a", MeetingStatus::Draft, &[]);
        let room = room_with(&gateway);
        room.refresh_meetings().await.unwrap();
        room.select_meeting_by_id("a").await.unwrap();

        let gate = gateway.gate("get_messages:a");
        advance(Duration::from_millis(2100)).await;

        room.start_meeting("a").await.unwrap();
        let opened = contents(&room);
        assert!(opened.contains(&"Good morning, team.".to_string()));

        gate.notify_one();
        advance(Duration::from_millis(10)).await;

        assert_eq!(contents(&room), opened);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_poll_after_reload_still_applies() {
        let gateway = MockGateway::new();
        gateway.seed_meeting("a", MeetingStatus::InProgress, &[]);
        let room = room_with(&gateway);
        room.select_meeting_by_id("a").await.unwrap();

        room.send_message("a", "user", "hello").await.unwrap();
        gateway.push_message("a", "pauli", "hi back");
        advance(Duration::from_millis(2100)).await;

        assert_eq!(contents(&room), ["hello", "hi back"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_room_stops_polling() {
        let gateway = MockGateway::new();
        gateway.seed_meeting("a", MeetingStatus::InProgress, &[]);
        let room = room_with(&gateway);
        room.select_meeting_by_id("a").await.unwrap();
        let polls = gateway.count("get_messages:a");

        drop(room);
        advance(Duration::from_secs(10)).await;

        assert_eq!(gateway.count("get_messages:a"), polls);
    }
}

mod dispatch_flow {
    use super::*;

    async fn active_room(gateway: &Arc<MockGateway>) -> (Arc<MeetingRoom>, String) {
        let room = room_with(gateway);
        let mut request = NewMeeting::new("Sprint 12", "plan week", MeetingType::SprintPlanning);
        request.invite_agents = vec!["devika".to_string(), "pauli".to_string()];
        let meeting = room.create_meeting(request).await.unwrap();
        room.start_meeting(&meeting.id).await.unwrap();
        (room, meeting.id)
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_blank_makes_no_call() {
        let gateway = MockGateway::new();
        let (room, id) = active_room(&gateway).await;
        let mark = gateway.calls().len();

        let err = room.send_message(&id, "user", " \n\t").await.unwrap_err();

        assert!(matches!(err, HuddleError::EmptyContent));
        assert!(gateway.calls_since(mark).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_without_active_meeting() {
        let gateway = MockGateway::new();
        let room = room_with(&gateway);

        let err = room.send_message("m1", "user", "hello").await.unwrap_err();

        assert!(matches!(err, HuddleError::NoActiveMeeting));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_posts_then_reloads_once() {
        let gateway = MockGateway::new();
        let (room, id) = active_room(&gateway).await;
        let mark = gateway.calls().len();

        room.send_message(&id, "user", "hello").await.unwrap();

        assert_eq!(
            gateway.calls_since(mark),
            vec![format!("post_message:{}", id), format!("get_messages:{}", id)]
        );
        assert!(contents(&room).contains(&"hello".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_as_agent() {
        let gateway = MockGateway::new();
        let (room, id) = active_room(&gateway).await;

        room.send_message(&id, "pauli", "speaking for Pauli").await.unwrap();

        let last = room.snapshot().messages.last().cloned().unwrap();
        assert_eq!(last.agent_id, "pauli");
        assert_eq!(last.meeting_id.as_deref(), Some(id.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_discussion_topic_falls_back_to_agenda() {
        let gateway = MockGateway::new();
        let (room, id) = active_room(&gateway).await;

        let outcome = room.trigger_discussion(&id, Some("  "), None).await.unwrap();

        assert_eq!(outcome.count, 2);
        assert!(gateway
            .calls()
            .contains(&format!("agent_discuss:{}:plan week", id)));
        assert!(contents(&room).contains(&"Agreed.".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_discussion_pending_flag() {
        let gateway = MockGateway::new();
        let (room, id) = active_room(&gateway).await;

        let gate = gateway.gate(&format!("agent_discuss:{}", id));
        let running = {
            let room = room.clone();
            let id = id.clone();
            tokio::spawn(async move { room.trigger_discussion(&id, Some("launch"), None).await })
        };
        wait_for_call(&gateway, &format!("agent_discuss:{}", id)).await;

        assert!(room.is_discussing());
        assert!(room.snapshot().discussion_pending);

        let err = room
            .trigger_discussion(&id, Some("again"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, HuddleError::DiscussionInProgress));

        gate.notify_one();
        let outcome = running.await.unwrap().unwrap();

        assert_eq!(outcome.count, 2);
        assert!(!room.is_discussing());
        assert!(!room.snapshot().discussion_pending);
        assert_eq!(
            gateway
                .calls()
                .iter()
                .filter(|c| c.starts_with("agent_discuss:"))
                .count(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_discussion_still_reloads() {
        let gateway = MockGateway::new();
        let (room, id) = active_room(&gateway).await;
        gateway.set_discuss_fails(true);
        let mark = gateway.calls().len();

        let err = room
            .trigger_discussion(&id, Some("launch"), None)
            .await
            .unwrap_err();

        assert!(err.is_transport_error());
        assert!(gateway
            .calls_since(mark)
            .contains(&format!("get_messages:{}", id)));
        assert!(contents(&room).contains(&"On launch: let's split it.".to_string()));
        assert!(!room.is_discussing());
    }
}

mod transport_failures {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_failed_transitions_leave_state_unchanged() {
        let gateway = MockGateway::new();
        let room = room_with(&gateway);
        let created = room
            .create_meeting(NewMeeting::new("Retro", "", MeetingType::Retrospective))
            .await
            .unwrap();
        let before = room.snapshot();

        gateway.set_fail(true);

        let err = room.start_meeting(&created.id).await.unwrap_err();
        assert!(err.is_transport_error());
        assert_eq!(room.snapshot(), before);

        let err = room.end_meeting(&created.id).await.unwrap_err();
        assert!(err.is_transport_error());
        assert_eq!(room.snapshot(), before);

        let err = room
            .send_message(&created.id, "user", "hello")
            .await
            .unwrap_err();
        assert!(err.is_transport_error());
        assert_eq!(room.snapshot(), before);

        let err = room
            .create_meeting(NewMeeting::new("Another", "", MeetingType::Standup))
            .await
            .unwrap_err();
        assert!(err.is_transport_error());
        assert_eq!(room.snapshot(), before);
        assert_eq!(gateway.remote_status(&created.id), Some(MeetingStatus::Draft));
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_failure_reports_offline() {
        let gateway = MockGateway::new();
        let room = room_with(&gateway);

        assert!(room.check_status().await.is_online());

        gateway.set_fail(true);
        let connectivity = room.check_status().await;
        assert_eq!(connectivity.state, ConnectionState::Offline);
        assert!(connectivity.detail.unwrap().contains("connection refused"));
        assert_eq!(room.snapshot().connectivity.state, ConnectionState::Offline);
    }
}

mod session_flow {
    use super::*;

    fn agent(id: &str, status: AgentStatus) -> Agent {
        Agent {
            id: id.to_string(),
            name: id.to_string(),
            role: String::new(),
            codename: String::new(),
            color: String::new(),
            avatar_letter: String::new(),
            status,
            repo: None,
            bio: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootstrap_loads_everything() {
        let gateway = MockGateway::new();
        gateway.seed_meeting("a", MeetingStatus::Draft, &[]);
        gateway.state.lock().unwrap().agents = vec![
            agent("devika", AgentStatus::Online),
            agent("ghost", AgentStatus::Hidden),
        ];
        let room = room_with(&gateway);

        let boot = room.bootstrap().await;

        assert!(boot.connectivity.is_online());
        assert_eq!(boot.meetings.unwrap().len(), 1);
        assert_eq!(boot.agents.unwrap().len(), 1);

        let snapshot = room.snapshot();
        assert_eq!(snapshot.meetings.len(), 1);
        assert_eq!(snapshot.agents.len(), 1);
        assert!(snapshot.active_meeting.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootstrap_survives_offline_gateway() {
        let gateway = MockGateway::new();
        gateway.set_fail(true);
        let room = room_with(&gateway);

        let boot = room.bootstrap().await;

        assert_eq!(boot.connectivity.state, ConnectionState::Offline);
        assert!(boot.meetings.is_err());
        assert!(boot.agents.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_unknown_meeting_fetches_it() {
        let gateway = MockGateway::new();
        gateway.seed_meeting("remote", MeetingStatus::InProgress, &["hi"]);
        let room = room_with(&gateway);

        let meeting = room.select_meeting_by_id("remote").await.unwrap();

        assert_eq!(meeting.id, "remote");
        assert_eq!(gateway.count("get_meeting:remote"), 1);
        assert_eq!(room.snapshot().meetings.len(), 1);
        assert_eq!(contents(&room), ["hi"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_active_stops_polling() {
        let gateway = MockGateway::new();
        gateway.seed_meeting("a", MeetingStatus::InProgress, &["hi"]);
        let room = room_with(&gateway);
        room.select_meeting_by_id("a").await.unwrap();

        room.clear_active();
        let polls = gateway.count("get_messages:a");
        advance(Duration::from_secs(10)).await;

        assert_eq!(gateway.count("get_messages:a"), polls);
        assert!(room.snapshot().messages.is_empty());
    }
}
