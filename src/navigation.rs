//! Navigation hook through which a failed refresh sends the user back to the login view.
//!
//! The client never touches a browser or router directly. The embedding application implements
//! [`NavigationHook`] to report which view is showing and to perform the redirect; headless
//! embeddings (jobs, tests, scripts) use [`DetachedNavigation`], which never redirects.

// self
use crate::_prelude::*;

/// Embedding application hook consulted after a failed session refresh.
pub trait NavigationHook
where
	Self: Send + Sync,
{
	/// Location of the view currently shown, if any (path, optionally with a query string).
	fn current_location(&self) -> Option<String>;

	/// Navigates to `location`.
	fn redirect(&self, location: &str);
}

/// Hook for embeddings without a view; it never reports a location and so never redirects.
#[derive(Clone, Copy, Debug, Default)]
pub struct DetachedNavigation;
impl NavigationHook for DetachedNavigation {
	fn current_location(&self) -> Option<String> {
		None
	}

	fn redirect(&self, _location: &str) {}
}

/// Closure-backed hook for embeddings that track the current view themselves.
pub struct FnNavigation<L, R> {
	locate: L,
	navigate: R,
}
impl<L, R> FnNavigation<L, R>
where
	L: Fn() -> Option<String> + Send + Sync,
	R: Fn(&str) + Send + Sync,
{
	/// Wraps a location probe and a redirect callback.
	pub fn new(locate: L, navigate: R) -> Self {
		Self { locate, navigate }
	}
}
impl<L, R> NavigationHook for FnNavigation<L, R>
where
	L: Fn() -> Option<String> + Send + Sync,
	R: Fn(&str) + Send + Sync,
{
	fn current_location(&self) -> Option<String> {
		(self.locate)()
	}

	fn redirect(&self, location: &str) {
		(self.navigate)(location)
	}
}
impl<L, R> Debug for FnNavigation<L, R> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FnNavigation(..)")
	}
}
