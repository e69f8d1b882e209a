//! Message sync engine.
//!
//! Polls the transport for messages newer than the room watermark, delivers
//! each timestamp at most once per room session and tracks connectivity.
//! At most one poll is in flight at any time; a repeating background task
//! drives the cadence and can be cancelled with [`SyncEngine::stop`].

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::common::{ChatEvent, ChatMessage, SubmitRequest};
use crate::error::SyncError;

use super::transport::Transport;

/// Cấu hình nhịp poll và chính sách retry.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Nhịp poll cố định khi đang kết nối (hoặc đang kết nối lần đầu).
    pub poll_interval: Duration,
    /// Khoảng chờ giữa hai lần poll khi đã mất kết nối.
    pub retry_delay: Duration,
    /// Thời gian tối đa cho một request; quá hạn được tính là lỗi.
    pub request_timeout: Duration,
    /// Số lỗi liên tiếp trước khi báo mất kết nối.
    pub failure_threshold: u32,
    /// Giữ lại tối đa N timestamp mới nhất trong tập chống trùng (None = không giới hạn).
    pub seen_retention: Option<usize>,
    pub max_message_length: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(5000),
            retry_delay: Duration::from_millis(10_000),
            request_timeout: Duration::from_millis(8000),
            failure_threshold: 3,
            seen_retention: None,
            max_message_length: 500,
        }
    }
}

/// Connection health as last observed by a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// No poll has succeeded or hit the failure threshold yet.
    #[default]
    Connecting,
    Connected,
    Disconnected,
}

/// Trạng thái đồng bộ của một phòng.
#[derive(Debug, Clone, Default)]
pub struct SyncState {
    pub current_room: String,
    /// Watermark: không bao giờ giảm trong một phiên phòng.
    pub last_seen_timestamp: i64,
    pub seen_timestamps: BTreeSet<i64>,
    pub consecutive_failures: u32,
    pub connectivity: Connectivity,
}

impl SyncState {
    pub fn new(room: impl Into<String>) -> Self {
        Self {
            current_room: room.into(),
            ..Self::default()
        }
    }

    pub fn connected(&self) -> bool {
        self.connectivity == Connectivity::Connected
    }

    /// Chuyển sang phòng mới: xóa watermark và tập chống trùng.
    ///
    /// Bộ đếm lỗi và trạng thái kết nối thuộc về endpoint nên được giữ nguyên.
    pub fn reset_for_room(&mut self, room: impl Into<String>) {
        self.current_room = room.into();
        self.last_seen_timestamp = 0;
        self.seen_timestamps.clear();
    }

    /// Áp dụng một phản hồi poll thành công, trả về các sự kiện cần phát.
    pub fn apply_batch(
        &mut self,
        messages: Vec<ChatMessage>,
        seen_retention: Option<usize>,
    ) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        let tail = messages.last().map(|message| message.timestamp);

        for mut message in messages {
            if !self.seen_timestamps.insert(message.timestamp) {
                continue;
            }
            message.room = self.current_room.clone();
            events.push(ChatEvent::MessageReceived(message));
        }

        // Watermark theo phần tử cuối của phản hồi gốc, kể cả khi tất cả đều trùng.
        if let Some(tail) = tail {
            self.last_seen_timestamp = self.last_seen_timestamp.max(tail);
        }

        if let Some(cap) = seen_retention {
            while self.seen_timestamps.len() > cap {
                self.seen_timestamps.pop_first();
            }
        }

        self.consecutive_failures = 0;
        if self.connectivity != Connectivity::Connected {
            self.connectivity = Connectivity::Connected;
            events.push(ChatEvent::ConnectionChanged(true));
        }

        events
    }

    /// Ghi nhận một lần poll lỗi. Chỉ báo mất kết nối khi chạm ngưỡng.
    pub fn record_failure(&mut self, failure_threshold: u32) -> Option<ChatEvent> {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.consecutive_failures >= failure_threshold
            && self.connectivity != Connectivity::Disconnected
        {
            self.connectivity = Connectivity::Disconnected;
            return Some(ChatEvent::ConnectionChanged(false));
        }
        None
    }
}

/// What a single call to [`SyncEngine::poll`] ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Another poll was still in flight.
    Skipped,
    /// The engine was stopped or switched rooms while the request was pending.
    Discarded,
    Delivered(usize),
    Failed(SyncError),
}

struct PollTask {
    stop: CancellationToken,
    _task: JoinHandle<()>,
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

struct Inner<T> {
    transport: T,
    username: String,
    config: SyncConfig,
    event_sender: mpsc::Sender<ChatEvent>,
    state: Mutex<SyncState>,
    fetching: AtomicBool,
    /// Tăng mỗi lần stop/đổi phòng; poll nào mang thế hệ cũ sẽ bị bỏ kết quả.
    generation: AtomicU64,
    poll_task: Mutex<Option<PollTask>>,
}

/// Clears the in-flight flag on every exit path of a poll.
struct FetchGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> FetchGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Engine đồng bộ tin nhắn cho một phiên đăng nhập.
///
/// Clone rẻ (chia sẻ cùng trạng thái); task poll nền giữ tham chiếu yếu nên
/// khi mọi handle bị drop thì task tự dừng.
pub struct SyncEngine<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for SyncEngine<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> SyncEngine<T> {
    pub fn new(
        transport: T,
        username: impl Into<String>,
        config: SyncConfig,
        event_sender: mpsc::Sender<ChatEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                username: username.into(),
                config,
                event_sender,
                state: Mutex::new(SyncState::default()),
                fetching: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                poll_task: Mutex::new(None),
            }),
        }
    }

    pub fn username(&self) -> &str {
        &self.inner.username
    }

    pub fn current_room(&self) -> String {
        self.lock_state().current_room.clone()
    }

    /// Snapshot of the current sync state.
    pub fn state(&self) -> SyncState {
        self.lock_state().clone()
    }

    pub fn is_fetching(&self) -> bool {
        self.inner.fetching.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.lock_task().is_some()
    }

    fn lock_state(&self) -> MutexGuard<'_, SyncState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<PollTask>> {
        self.inner
            .poll_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Poll một lần. Không bao giờ trả lỗi ra ngoài: mọi lỗi được chuyển
    /// thành cập nhật trạng thái.
    pub async fn poll(&self) -> PollOutcome {
        let generation = self.inner.generation.load(Ordering::Acquire);
        self.poll_session(generation).await
    }

    /// Poll thuộc về phiên `generation`; phiên đã kết thúc thì không fetch.
    async fn poll_session(&self, generation: u64) -> PollOutcome {
        let Some(_busy) = FetchGuard::acquire(&self.inner.fetching) else {
            log::debug!("Poll skipped: previous request still in flight");
            return PollOutcome::Skipped;
        };

        if generation != self.inner.generation.load(Ordering::Acquire) {
            log::debug!("Poll skipped: session already ended");
            return PollOutcome::Discarded;
        }
        let (room, since) = {
            let state = self.lock_state();
            (state.current_room.clone(), state.last_seen_timestamp)
        };

        let timeout = self.inner.config.request_timeout;
        let result =
            match tokio::time::timeout(timeout, self.inner.transport.fetch(&room, since)).await {
                Ok(Ok(response)) if response.success => Ok(response.messages),
                Ok(Ok(response)) => Err(SyncError::MalformedResponse(
                    response
                        .error
                        .unwrap_or_else(|| "server reported success=false".to_string()),
                )),
                Ok(Err(err)) => Err(err),
                Err(_) => Err(SyncError::Timeout(timeout)),
            };

        let (events, outcome) = {
            let mut state = self.lock_state();
            if generation != self.inner.generation.load(Ordering::Acquire) {
                log::debug!("Discarding poll result for room {room}: session changed");
                return PollOutcome::Discarded;
            }

            match result {
                Ok(messages) => {
                    let received = messages.len();
                    let events = state.apply_batch(messages, self.inner.config.seen_retention);
                    let delivered = events
                        .iter()
                        .filter(|event| matches!(event, ChatEvent::MessageReceived(_)))
                        .count();
                    log::debug!(
                        "Poll of room {room} since {since}: {received} received, {delivered} new, watermark {}",
                        state.last_seen_timestamp
                    );
                    (events, PollOutcome::Delivered(delivered))
                }
                Err(err) => {
                    log::warn!(
                        "Poll of room {room} failed ({} in a row): {err}",
                        state.consecutive_failures + 1
                    );
                    let events = state
                        .record_failure(self.inner.config.failure_threshold)
                        .into_iter()
                        .collect();
                    (events, PollOutcome::Failed(err))
                }
            }
        };

        for event in events {
            if let ChatEvent::ConnectionChanged(connected) = &event {
                log::info!(
                    "Connection {}",
                    if *connected { "established" } else { "lost" }
                );
            }
            if let Err(err) = self.inner.event_sender.send(event).await {
                log::debug!("Event receiver dropped: {err}");
            }
        }

        outcome
    }

    /// Bắt đầu đồng bộ `room`: poll ngay một lần rồi poll định kỳ.
    ///
    /// Gọi lại khi đang chạy là no-op (không tạo timer thứ hai).
    pub async fn start(&self, room: &str) {
        let session = {
            let mut task = self.lock_task();
            if task.is_some() {
                log::debug!("Sync already running; ignoring start for room {room}");
                return;
            }

            self.lock_state().reset_for_room(room);
            let session = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;

            let stop = CancellationToken::new();
            let handle = tokio::spawn(run_poll_loop(
                Arc::downgrade(&self.inner),
                stop.child_token(),
                session,
                self.inner.config.poll_interval,
            ));
            *task = Some(PollTask {
                stop,
                _task: handle,
            });
            session
        };

        log::info!("Started syncing room {room}");
        self.poll_session(session).await;
    }

    /// Hủy timer poll. Request đang bay không bị hủy nhưng kết quả bị bỏ qua.
    pub fn stop(&self) {
        let task = self.lock_task().take();
        match task {
            Some(task) => {
                self.inner.generation.fetch_add(1, Ordering::AcqRel);
                drop(task);
                log::info!("Stopped syncing room {}", self.current_room());
            }
            None => log::debug!("Stop called while not syncing"),
        }
    }

    pub async fn switch_room(&self, new_room: &str) {
        self.stop();
        {
            self.lock_state().reset_for_room(new_room);
            self.inner.generation.fetch_add(1, Ordering::AcqRel);
        }
        self.start(new_room).await;
    }

    /// Gửi tin nhắn vào phòng hiện tại.
    ///
    /// `Ok` chỉ có nghĩa là request đã được gửi đi; server không xác nhận
    /// việc lưu tin. Không tự retry. Người gọi nên poll lại sau đó để thấy
    /// tin nhắn của chính mình.
    pub async fn submit(&self, message: &str) -> Result<(), SyncError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(SyncError::EmptyMessage);
        }
        let max = self.inner.config.max_message_length;
        if message.chars().count() > max {
            return Err(SyncError::MessageTooLong { max });
        }

        let room = self.current_room();
        let request = SubmitRequest {
            room: &room,
            username: &self.inner.username,
            message,
        };

        let timeout = self.inner.config.request_timeout;
        match tokio::time::timeout(timeout, self.inner.transport.submit(request)).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::Timeout(timeout)),
        }
    }
}

/// Nhịp poll nền. Khi mất kết nối, các tick bị bỏ qua cho tới khi đủ `retry_delay`.
///
/// Mọi poll của vòng lặp gắn với `session`; sau `stop()` không còn fetch nào.
async fn run_poll_loop<T: Transport>(
    inner: Weak<Inner<T>>,
    stop: CancellationToken,
    session: u64,
    poll_interval: Duration,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + poll_interval, poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_poll = Instant::now();

    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            _ = ticker.tick() => {}
        }
        // Tick quá hạn trong lúc poll trước còn chạy có thể tới cùng lúc với stop.
        if stop.is_cancelled() {
            break;
        }

        let Some(inner) = inner.upgrade() else {
            break;
        };
        let engine = SyncEngine { inner };

        let disconnected = engine.lock_state().connectivity == Connectivity::Disconnected;
        if disconnected && last_poll.elapsed() < engine.inner.config.retry_delay {
            continue;
        }

        last_poll = Instant::now();
        engine.poll_session(session).await;
    }

    log::debug!("Poll loop finished");
}
