use std::sync::Arc;

use pagebind_binder::{BindError, ContractPolicy};
use pagebind_model::{Container, Item, ItemKind};

use crate::common::{Event, Harness, RecordingConsumer, config, grid};

#[test]
fn writes_stay_held_until_the_session_tail_resumes_them() {
	let h = Harness::new();
	h.add(grid(0, 2, 10));
	h.add(grid(1, 2, 20));
	let consumer = Arc::new(RecordingConsumer::new("main", [0]).holding_deferred());

	h.binder(config(6), &[&consumer]).bind_workspace(true, true).expect("bind");
	assert!(h.install.is_paused());
	h.pump();

	assert!(!h.install.queue(Item::cell(99, ItemKind::Shortcut, 2, 0, 0)).expect("queued"));
	assert_eq!(h.install.pending_len(), 1);

	let [(deferred, completion)]: [_; 1] = consumer.take_held().try_into().expect("one settled session");
	deferred.release().expect("release");
	// other items, string cache, finish, resume, completion
	assert_eq!(h.ui.len(), 5);

	for _ in 0..3 {
		assert!(h.ui.run_next());
	}
	assert!(h.install.is_paused());
	assert_eq!(consumer.events().last(), Some(&Event::Finish([0].into())));

	assert!(h.ui.run_next());
	assert!(!h.install.is_paused());
	assert!(h.model.write(|tables| tables.item(99).is_some()));
	assert!(!completion.is_complete());

	assert!(h.ui.run_next());
	assert!(completion.is_complete());
	assert!(h.ui.is_idle());
}

#[test]
fn superseded_cycle_still_resumes_the_queue() {
	let h = Harness::new();
	h.add(grid(0, 2, 10));
	let consumer = Arc::new(RecordingConsumer::new("main", [0]).holding_deferred());
	let binder = h.binder(config(6), &[&consumer]);

	binder.bind_workspace(true, true).expect("bind");
	h.pump();
	let [(deferred, _)]: [_; 1] = consumer.take_held().try_into().expect("one settled session");

	h.model.begin_load();
	h.model.take_snapshot(true);
	deferred.release().expect("release");
	h.pump();

	assert!(!h.install.is_paused());
	assert_eq!(consumer.count(|e| matches!(e, Event::Finish(_))), 0);
}

#[test]
fn cycle_without_sessions_never_pauses_the_queue() {
	let h = Harness::new();
	h.add(grid(0, 2, 10));
	let broken = Arc::new(RecordingConsumer::without_visible_pages("broken"));
	let mut cfg = config(6);
	cfg.contract_policy = ContractPolicy::Lenient;

	let cycle = h.binder(cfg.clone(), &[&broken]).bind_workspace(true, true).expect("lenient bind");
	assert_eq!(cycle.skipped, vec!["broken".to_owned()]);
	assert!(!h.install.is_paused());

	h.binder(cfg, &[]).bind_workspace(true, true).expect("no consumers");
	h.pump();
	assert!(!h.install.is_paused());
	assert!(h.install.queue(Item::cell(99, ItemKind::Shortcut, 0, 3, 3)).expect("written through"));
}

#[test]
fn cycle_superseded_before_it_settles_resumes_the_queue() {
	for materialize in [false, true] {
		let h = Harness::new();
		h.add(grid(0, 2, 10));
		h.add(grid(1, 2, 20));
		let consumer = RecordingConsumer::new("main", [0]);
		let consumer = Arc::new(if materialize { consumer.materializing() } else { consumer });
		let mut cfg = config(6);
		cfg.async_materialization = materialize;

		h.binder(cfg, &[&consumer]).bind_workspace(true, true).expect("bind");
		assert!(!h.install.queue(Item::cell(99, ItemKind::Shortcut, 2, 0, 0)).expect("queued"));

		h.model.take_snapshot(true);
		h.pump();

		assert!(!h.install.is_paused(), "materialize={materialize}");
		assert!(h.model.write(|tables| tables.item(99).is_some()));
		assert_eq!(consumer.count(|e| matches!(e, Event::Settled { .. })), 0);
	}
}

#[test]
fn strict_abort_releases_the_pause_of_the_cycle_it_supersedes() {
	let h = Harness::new();
	h.add(grid(0, 2, 10));
	let consumer = Arc::new(RecordingConsumer::new("main", [0]).holding_deferred());
	let binder = h.binder(config(6), &[&consumer]);

	binder.bind_workspace(true, true).expect("bind");
	h.pump();
	assert!(h.install.is_paused());
	let held = consumer.take_held();

	h.add([Item::cell(77, ItemKind::Shortcut, 0, 3, 3).with_container(Container::Unknown(-250))]);
	let err = binder.bind_workspace(true, true).unwrap_err();
	assert!(matches!(err, BindError::UnknownContainer { item: 77, .. }), "{err}");
	assert!(!h.install.is_paused());
	drop(held);
}

#[test]
fn overlapping_cycles_hold_writes_until_the_newest_finishes() {
	let h = Harness::new();
	h.add(grid(0, 2, 10));
	let consumer = Arc::new(RecordingConsumer::new("main", [0]).holding_deferred());
	let binder = h.binder(config(6), &[&consumer]);

	binder.bind_workspace(true, true).expect("first bind");
	h.pump();
	let [(first, _)]: [_; 1] = consumer.take_held().try_into().expect("first settled");

	binder.bind_workspace(true, true).expect("second bind");
	h.pump();
	let [(second, _)]: [_; 1] = consumer.take_held().try_into().expect("second settled");

	first.release().expect("release first");
	h.pump();
	assert!(h.install.is_paused());

	second.release().expect("release second");
	h.pump();
	assert!(!h.install.is_paused());
}
