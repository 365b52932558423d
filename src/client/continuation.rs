//! Opt-in helpers for draining the pending tasks of resource enumeration.
//!
//! A handler may split enumeration into rounds: each [`LoadResponse`] carries resources plus
//! follow-up [`PendingTask`]s that must be resubmitted as new load requests. [`TaskQueue`]
//! keeps that bookkeeping in caller hands; [`ResourceWalker`] drives it sequentially under a
//! mandatory round cap.

// std
use std::collections::VecDeque;
// self
use crate::{
	_prelude::*,
	client::HandlerClient,
	id::TaskName,
	msg::{LoadResources, LoadResponse, PendingTask, Resource},
	obs,
};

impl PendingTask {
	/// Converts this task into the load request that continues it.
	pub fn into_request(self) -> LoadResources {
		LoadResources { task: self.task, ctx: self.ctx }
	}
}

impl LoadResponse {
	/// Returns `true` when the handler asked for no further rounds.
	pub fn is_terminal(&self) -> bool {
		self.tasks.is_empty()
	}
}

/// FIFO of pending enumeration work.
///
/// Tasks are yielded in the order the handler returned them, breadth first across rounds.
///
/// ```
/// use handler_runtime::{
/// 	client::TaskQueue,
/// 	id::TaskName,
/// 	msg::{JsonObject, LoadResponse},
/// };
///
/// let mut queue = TaskQueue::new(TaskName::new("list_users").unwrap(), JsonObject::new());
/// let first = queue.next().unwrap();
///
/// assert_eq!(first.task.as_str(), "list_users");
/// assert!(queue.absorb(LoadResponse::default()).is_empty());
/// assert!(queue.is_empty());
/// assert_eq!(queue.rounds(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct TaskQueue {
	pending: VecDeque<PendingTask>,
	rounds: usize,
}
impl TaskQueue {
	/// Seeds the queue with the initial task.
	pub fn new(task: TaskName, ctx: JsonObject) -> Self {
		Self { pending: VecDeque::from([PendingTask { task, ctx }]), rounds: 0 }
	}

	/// Queues the response's follow-up tasks and hands back its resources.
	pub fn absorb(&mut self, response: LoadResponse) -> Vec<Resource> {
		self.pending.extend(response.tasks);

		response.resources
	}

	/// Returns `true` when no work is left.
	pub fn is_empty(&self) -> bool {
		self.pending.is_empty()
	}

	/// Number of tasks still queued.
	pub fn len(&self) -> usize {
		self.pending.len()
	}

	/// Number of tasks taken from the queue so far.
	pub fn rounds(&self) -> usize {
		self.rounds
	}
}
impl Iterator for TaskQueue {
	type Item = PendingTask;

	fn next(&mut self) -> Option<Self::Item> {
		let task = self.pending.pop_front()?;

		self.rounds += 1;

		Some(task)
	}
}

/// Sequential enumeration driver with a caller-chosen round cap.
#[derive(Clone, Copy, Debug)]
pub struct ResourceWalker<'a> {
	client: &'a HandlerClient,
	max_rounds: usize,
}
impl<'a> ResourceWalker<'a> {
	/// Creates a walker that issues at most `max_rounds` load requests per run.
	pub fn new(client: &'a HandlerClient, max_rounds: usize) -> Self {
		Self { client, max_rounds }
	}

	/// Loads `task` and every task it spawns, collecting all resources.
	///
	/// Fails with [`Error::RoundLimit`] when work remains after `max_rounds` requests. Any call
	/// failure aborts the walk; resources gathered so far are discarded.
	pub async fn run(&self, task: &TaskName, ctx: JsonObject) -> Result<Vec<Resource>> {
		let mut queue = TaskQueue::new(task.clone(), ctx);
		let mut resources = Vec::new();

		loop {
			if queue.rounds() >= self.max_rounds && !queue.is_empty() {
				return Err(Error::RoundLimit { limit: self.max_rounds, pending: queue.len() });
			}

			let Some(pending) = queue.next() else { break };
			let request = pending.into_request();
			let response = self.client.fetch_resources(&request.task, request.ctx).await?;

			resources.extend(queue.absorb(response));
		}

		obs::event!(
			debug,
			task = %task,
			rounds = queue.rounds(),
			resources = resources.len(),
			"resource enumeration finished"
		);

		Ok(resources)
	}
}
