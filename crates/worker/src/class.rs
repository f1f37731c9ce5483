/// Execution classes used for scheduling diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Consumer-visible work that must run on the UI-affine executor.
	Interactive,
	/// Loader and snapshot work that never touches a consumer.
	Background,
	/// Per-item materialization; CPU-bound and safe to run on any worker.
	Materialize,
}

impl TaskClass {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Interactive => "interactive",
			Self::Background => "background",
			Self::Materialize => "materialize",
		}
	}
}
