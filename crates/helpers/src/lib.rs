use std::cell::RefCell;
use std::hash::BuildHasherDefault;
use std::panic;
use std::sync::Once;

pub type IndexMap<K, V> = indexmap::IndexMap<K, V, BuildHasherDefault<ahash::AHasher>>;
pub type IndexSet<V> = indexmap::IndexSet<V, BuildHasherDefault<ahash::AHasher>>;

pub trait Config: Sized {
    fn config(mut self, f: impl FnOnce(&mut Self)) -> Self {
        f(&mut self);
        self
    }
}

impl<T> Config for T {}

/// Push a frame onto the thread-local match trail.
///
/// If anything panics while the returned guard is alive, the trail is
/// printed before the default panic message, so an internal invariant
/// violation deep inside the matcher reports which grammar it was in.
pub fn enter_match_frame(frame: String) -> MatchFrame {
    static ONCE: Once = Once::new();
    ONCE.call_once(MatchFrame::install_hook);

    with_trail(|trail| trail.push(frame));
    MatchFrame { _priv: () }
}

/// Current depth of the match trail on this thread.
pub fn match_trail_depth() -> usize {
    let mut depth = 0;
    with_trail(|trail| depth = trail.len());
    depth
}

#[must_use]
pub struct MatchFrame {
    _priv: (),
}

impl MatchFrame {
    #[allow(clippy::print_stderr)]
    fn install_hook() {
        let default_hook = panic::take_hook();
        let hook = move |panic_info: &panic::PanicHookInfo<'_>| {
            with_trail(|trail| {
                if !trail.is_empty() {
                    eprintln!("Grammar trail (outermost first):");
                    for (depth, frame) in trail.iter().enumerate() {
                        eprintln!("{:>4}: {frame}", depth);
                    }
                }
                default_hook(panic_info);
            });
        };
        panic::set_hook(Box::new(hook));
    }
}

impl Drop for MatchFrame {
    fn drop(&mut self) {
        with_trail(|trail| assert!(trail.pop().is_some()));
    }
}

fn with_trail(f: impl FnOnce(&mut Vec<String>)) {
    thread_local! {
        static TRAIL: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }
    TRAIL.with(|trail| f(&mut trail.borrow_mut()));
}
