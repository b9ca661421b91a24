use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use log::debug;
use rand::Rng;
use rs_chat_core::Session;

/// Sessions unused for this long are dropped.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Most sessions kept at once; the least recently used one goes first.
pub const DEFAULT_CAPACITY: usize = 10_000;

struct Entry {
	session: Arc<Mutex<Session>>,
	last_used: Instant,
}

/// In-memory conversations, keyed by the id stored in the client's cookie.
///
/// Each session has its own lock, held for the whole of a chat call, so two
/// requests of the same conversation are serialized while different
/// conversations run in parallel.
///
/// Sessions are only stored once a first reply succeeded. Idle sessions
/// expire after `idle_timeout`, and the store never holds more than
/// `capacity` of them.
pub struct SessionStore {
	sessions: Mutex<HashMap<String, Entry>>,
	idle_timeout: Duration,
	capacity: usize,
}

impl Default for SessionStore {
	fn default() -> Self {
		Self::new(DEFAULT_IDLE_TIMEOUT, DEFAULT_CAPACITY)
	}
}

impl SessionStore {
	pub fn new(idle_timeout: Duration, capacity: usize) -> Self {
		Self { sessions: Mutex::new(HashMap::new()), idle_timeout, capacity: capacity.max(1) }
	}

	/// The live session `id`, marked as used now.
	pub fn get(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
		self.get_at(id, Instant::now())
	}

	/// Stores `session` under a fresh id and returns that id.
	pub fn insert(&self, session: Session) -> String {
		self.insert_at(session, Instant::now())
	}

	pub fn len(&self) -> usize {
		self.sessions.lock().unwrap_or_else(PoisonError::into_inner).len()
	}

	fn get_at(&self, id: &str, now: Instant) -> Option<Arc<Mutex<Session>>> {
		let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
		let entry = sessions.get_mut(id)?;
		if now.saturating_duration_since(entry.last_used) >= self.idle_timeout {
			sessions.remove(id);
			return None;
		}
		entry.last_used = now;
		Some(Arc::clone(&entry.session))
	}

	fn insert_at(&self, session: Session, now: Instant) -> String {
		let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);

		let before = sessions.len();
		sessions.retain(|_, entry| now.saturating_duration_since(entry.last_used) < self.idle_timeout);
		while sessions.len() >= self.capacity {
			let oldest = sessions.iter().min_by_key(|(_, entry)| entry.last_used).map(|(id, _)| id.clone());
			match oldest {
				Some(id) => sessions.remove(&id),
				None => break,
			};
		}
		if sessions.len() < before {
			debug!("evicted {} sessions", before - sessions.len());
		}

		let id = new_session_id();
		sessions.insert(id.clone(), Entry { session: Arc::new(Mutex::new(session)), last_used: now });
		id
	}
}

fn new_session_id() -> String {
	format!("{:032x}", rand::rng().random::<u128>())
}
