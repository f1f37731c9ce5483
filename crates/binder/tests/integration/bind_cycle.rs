use std::sync::Arc;

use pagebind_binder::{BindError, ContractPolicy, DeliveryKind, PageSet, UnknownContainerPolicy};
use pagebind_model::{Container, ExtraGroup, GroupTag, Item, ItemKind, ShortcutInfo};
use pretty_assertions::assert_eq;

use crate::common::{Event, Harness, RecordingConsumer, config, grid};

#[test]
fn fourteen_visible_items_arrive_in_three_sorted_chunks() {
	let h = Harness::new();
	h.add(grid(0, 14, 100));
	let consumer = Arc::new(RecordingConsumer::new("main", [0]));

	let cycle = h.binder(config(6), &[&consumer]).bind_workspace(true, true).expect("bind");
	h.pump();

	assert_eq!(cycle.item_count, 14);
	let batches = consumer.item_batches();
	assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![6, 6, 2]);
	assert_eq!(batches.concat(), (87..=100).rev().collect::<Vec<_>>());
}

#[test]
fn callbacks_follow_the_session_protocol() {
	let h = Harness::new();
	h.add([
		Item::ranked(50, ItemKind::Shortcut, 0),
		Item::cell(2, ItemKind::Shortcut, 0, 1, 0),
		Item::cell(1, ItemKind::Shortcut, 0, 0, 0),
		Item::cell(3, ItemKind::Widget { span_x: 2, span_y: 2 }, 0, 0, 1),
		Item::cell(4, ItemKind::Shortcut, 1, 0, 0),
		Item::cell(5, ItemKind::Widget { span_x: 4, span_y: 1 }, 1, 0, 1),
	]);
	h.model.write(|tables| {
		tables.set_extra_group(ExtraGroup::new(GroupTag::PREDICTION, vec![Item::ranked(60, ItemKind::Shortcut, 0)]));
		tables.set_string("app_label", "Files");
		tables.set_first_page_pinned_item_enabled(true);
	});
	let consumer = Arc::new(RecordingConsumer::new("main", [0]));
	let mut cfg = config(6);
	cfg.first_page_pinned_toggle = true;

	h.binder(cfg, &[&consumer]).bind_workspace(true, false).expect("bind");
	h.pump();

	assert_eq!(
		consumer.events(),
		vec![
			Event::Begin,
			Event::Pinned(true),
			Event::Containers(vec![0, 1]),
			Event::Items { ids: vec![50, 1, 2], widgets: false },
			Event::Items { ids: vec![3], widgets: true },
			Event::Extra(GroupTag::PREDICTION),
			Event::Settled {
				visible: PageSet::from([0]),
				item_count: 6,
				synchronous: false,
			},
			Event::Items { ids: vec![4], widgets: false },
			Event::Items { ids: vec![5], widgets: true },
			Event::Strings(1),
			Event::Finish(PageSet::from([0])),
			Event::Complete,
		]
	);
}

#[test]
fn visible_pages_select_the_current_buckets() {
	let h = Harness::new();
	h.add((1..=5).flat_map(|page| grid(page, 2, page * 10)));
	let consumer = Arc::new(RecordingConsumer::new("main", [3, 4]));

	let cycle = h.binder(config(6), &[&consumer]).bind_workspace(true, true).expect("bind");
	h.pump();

	let report = &cycle.consumers[0];
	assert_eq!(report.visible_pages, PageSet::from([3, 4]));
	assert_eq!((report.current_items, report.other_items), (4, 6));
	assert_eq!(report.delivery, DeliveryKind::Chunked);

	let batches = consumer.item_batches();
	assert_eq!(batches[0], vec![30, 29, 40, 39]);
	assert_eq!(batches[1], vec![10, 9, 20, 19, 50, 49]);
}

#[test]
fn rebinding_an_unchanged_model_repeats_the_same_content() {
	let h = Harness::new();
	h.add(grid(0, 9, 30));
	h.add(grid(2, 3, 60));
	let consumer = Arc::new(RecordingConsumer::new("main", [0]));
	let binder = h.binder(config(4), &[&consumer]);

	let first = binder.bind_workspace(true, true).expect("first bind");
	h.pump();
	let first_session = consumer.last_session();

	let second = binder.bind_workspace(true, true).expect("second bind");
	h.pump();

	assert!(second.generation > first.generation);
	assert_eq!(consumer.last_session(), first_session);
}

#[test]
fn every_consumer_receives_the_full_protocol() {
	let h = Harness::new();
	h.add(grid(0, 3, 10));
	h.add(grid(1, 3, 20));
	let main = Arc::new(RecordingConsumer::new("main", [0]));
	let overview = Arc::new(RecordingConsumer::new("overview", [1]));

	let cycle = h.binder(config(6), &[&main, &overview]).bind_workspace(true, true).expect("bind");
	h.pump();

	assert_eq!(cycle.consumers.len(), 2);
	assert_eq!(main.item_batches(), vec![vec![10, 9, 8], vec![20, 19, 18]]);
	assert_eq!(overview.item_batches(), vec![vec![20, 19, 18], vec![10, 9, 8]]);
	for consumer in [&main, &overview] {
		assert_eq!(consumer.count(|e| matches!(e, Event::Settled { .. })), 1);
		assert_eq!(consumer.count(|e| *e == Event::Complete), 1);
	}
}

#[test]
fn strict_null_contract_aborts_before_anything_is_posted() {
	let h = Harness::new();
	h.add(grid(0, 2, 10));
	let good = Arc::new(RecordingConsumer::new("main", [0]));
	let broken = Arc::new(RecordingConsumer::without_visible_pages("broken"));

	let err = h.binder(config(6), &[&good, &broken]).bind_workspace(true, true).unwrap_err();
	assert_eq!(err, BindError::NullContract { consumer: "broken".into() });
	assert!(h.ui.is_empty());
	assert!(!h.install.is_paused());
	h.pump();
	assert!(good.events().is_empty());
}

#[test]
fn lenient_null_contract_skips_the_consumer() {
	let h = Harness::new();
	h.add(grid(0, 2, 10));
	let good = Arc::new(RecordingConsumer::new("main", [0]));
	let broken = Arc::new(RecordingConsumer::without_visible_pages("broken"));
	let mut cfg = config(6);
	cfg.contract_policy = ContractPolicy::Lenient;

	let cycle = h.binder(cfg, &[&good, &broken]).bind_workspace(true, true).expect("lenient bind");
	h.pump();

	assert_eq!(cycle.skipped, vec!["broken".to_owned()]);
	assert_eq!(good.item_batches(), vec![vec![10, 9]]);
	assert!(broken.events().is_empty());
}

#[test]
fn unknown_containers_follow_policy() {
	let h = Harness::new();
	h.add(grid(0, 2, 10));
	h.add([Item::cell(77, ItemKind::Shortcut, 0, 3, 3).with_container(Container::Unknown(-250))]);
	let consumer = Arc::new(RecordingConsumer::new("main", [0]));

	let err = h.binder(config(6), &[&consumer]).bind_workspace(true, true).unwrap_err();
	assert!(matches!(err, BindError::UnknownContainer { item: 77, .. }), "{err}");

	let mut cfg = config(6);
	cfg.unknown_container = UnknownContainerPolicy::DefaultRank;
	let cycle = h.binder(cfg, &[&consumer]).bind_workspace(true, true).expect("lenient bind");
	h.pump();

	assert_eq!(cycle.consumers[0].orphaned, 1);
	assert_eq!(consumer.item_batches(), vec![vec![10, 9]]);
}

#[test]
fn deep_shortcut_counts_reach_every_consumer() {
	let h = Harness::new();
	let shortcut = |activity: &str| ShortcutInfo {
		package: "org.example.mail".into(),
		activity: Some(activity.into()),
		user: 0,
		enabled: true,
		declared_in_manifest: true,
		dynamic: false,
	};
	h.model.write(|tables| tables.update_deep_shortcut_counts(Some("org.example.mail"), 0, &[shortcut("Inbox"), shortcut("Inbox"), shortcut("Compose")]));
	let main = Arc::new(RecordingConsumer::new("main", [0]));
	let overview = Arc::new(RecordingConsumer::new("overview", [0]));

	h.binder(config(6), &[&main, &overview]).bind_deep_shortcuts();
	h.pump();

	assert_eq!(main.events(), vec![Event::Shortcuts(3)]);
	assert_eq!(overview.events(), vec![Event::Shortcuts(3)]);
}

#[test]
fn collection_children_arrive_inside_their_collection() {
	for materialize in [false, true] {
		let h = Harness::new();
		h.add([
			Item::cell(1, ItemKind::Collection, 0, 0, 0),
			Item::child_of(2, 1, 1),
			Item::child_of(3, 1, 0),
			Item::cell(4, ItemKind::Collection, 1, 0, 0),
			Item::child_of(5, 4, 0),
		]);
		let consumer = RecordingConsumer::new("main", [0]);
		let consumer = Arc::new(if materialize { consumer.materializing() } else { consumer });
		let mut cfg = config(6);
		cfg.async_materialization = materialize;

		let cycle = h.binder(cfg, &[&consumer]).bind_workspace(true, true).expect("bind");
		h.pump();

		assert_eq!(cycle.item_count, 5);
		assert_eq!(cycle.consumers[0].nested, 3);
		assert_eq!(cycle.consumers[0].orphaned, 0);
		assert_eq!(consumer.item_batches(), vec![vec![1], vec![4]]);
		assert_eq!(consumer.collection_contents(), vec![(1, vec![3, 2]), (4, vec![5])]);
	}
}
