//! Widgets - the live nodes produced by inflation.
//!
//! The native toolkit is not part of the kernel. Every widget instead owns a
//! headless [`View`] that records what the toolkit would be told: view id,
//! layout params, visibility, children and so on. Concrete widget kinds live
//! next to their parsers in [`crate::parsers`].

use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use trellis_api::Value;

use crate::manager::Manager;
use crate::IdGenerator;

/// Process-unique identity of a widget, used as the key of side tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(pub u64);

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Counter for generating widget identities.
static WIDGET_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a new unique widget identity.
pub fn next_widget_id() -> WidgetId {
    WidgetId(WIDGET_ID_COUNTER.fetch_add(1, Ordering::SeqCst))
}

/// Shared handle to a widget.
pub type WidgetRef = Arc<dyn Widget>;

/// A live UI node.
pub trait Widget: Send + Sync + 'static {
    /// The headless view backing this widget.
    fn as_view(&self) -> &View;

    fn as_any(&self) -> &dyn Any;

    /// Kind-specific details for tree dumps (text content, hint, ...).
    fn summary(&self) -> String {
        String::new()
    }

    fn view_manager(&self) -> Option<Arc<Manager>> {
        self.as_view().manager_slot().get()
    }

    /// Attach `manager` unless one is already attached. Returns whether it was attached.
    fn set_view_manager(&self, manager: Arc<Manager>) -> bool {
        self.as_view().manager_slot().set(manager)
    }
}

impl fmt::Debug for dyn Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_view().fmt(f)
    }
}

/// Downcast a widget handle to its concrete kind.
pub fn downcast<T: Widget>(widget: &WidgetRef) -> Option<&T> {
    widget.as_any().downcast_ref::<T>()
}

/// Attach-once state of a widget's manager.
#[derive(Debug, Default)]
pub enum ManagerState {
    #[default]
    Uninitialized,
    Attached(Arc<Manager>),
}

/// Holds a widget's manager. The transition `Uninitialized -> Attached`
/// happens at most once and the check-then-set is atomic.
#[derive(Debug, Default)]
pub struct ManagerSlot {
    state: Mutex<ManagerState>,
}

impl ManagerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self) -> Option<Arc<Manager>> {
        match &*self.lock() {
            ManagerState::Attached(manager) => Some(manager.clone()),
            ManagerState::Uninitialized => None,
        }
    }

    pub fn is_attached(&self) -> bool {
        matches!(*self.lock(), ManagerState::Attached(_))
    }

    /// Attach `manager` if the slot is still uninitialized.
    pub fn set(&self, manager: Arc<Manager>) -> bool {
        let mut state = self.lock();
        match *state {
            ManagerState::Attached(_) => false,
            ManagerState::Uninitialized => {
                *state = ManagerState::Attached(manager);
                true
            }
        }
    }

    /// Build and attach a manager if the slot is uninitialized.
    ///
    /// The slot stays locked while `build` runs, so two callers racing on the
    /// same widget build exactly one manager. `build` must not touch this slot.
    /// Returns the new manager, or `None` if one was already attached.
    pub fn attach_with<E>(
        &self,
        build: impl FnOnce() -> Result<Arc<Manager>, E>,
    ) -> Result<Option<Arc<Manager>>, E> {
        let mut state = self.lock();
        if let ManagerState::Attached(_) = *state {
            return Ok(None);
        }
        let manager = build()?;
        *state = ManagerState::Attached(manager.clone());
        Ok(Some(manager))
    }
}

/// Size of a view along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dimension {
    MatchParent,
    #[default]
    WrapContent,
    Pixels(i32),
}

impl Dimension {
    /// Parses `match_parent` / `fill_parent` / `wrap_content`, plain numbers
    /// and numbers suffixed with `px`, `dp` or `sp`.
    pub fn parse(value: &Value) -> Option<Dimension> {
        if let Some(n) = value.as_i64() {
            return i32::try_from(n).ok().map(Dimension::Pixels);
        }
        let text = value.as_str()?.trim();
        match text {
            "match_parent" | "fill_parent" => Some(Dimension::MatchParent),
            "wrap_content" => Some(Dimension::WrapContent),
            other => {
                let number = other
                    .strip_suffix("px")
                    .or_else(|| other.strip_suffix("dp"))
                    .or_else(|| other.strip_suffix("sp"))
                    .unwrap_or(other);
                number.trim().parse().ok().map(Dimension::Pixels)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Invisible,
    Gone,
}

impl Visibility {
    pub fn parse(value: &Value) -> Option<Visibility> {
        match value.as_str()?.trim() {
            "visible" => Some(Visibility::Visible),
            "invisible" => Some(Visibility::Invisible),
            "gone" => Some(Visibility::Gone),
            _ => None,
        }
    }
}

/// Relative positioning rule understood by `relative-layout` parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelativeRule {
    Below,
    Above,
    LeftOf,
    RightOf,
    AlignParentTop,
    AlignParentBottom,
    AlignParentLeft,
    AlignParentRight,
    CenterInParent,
}

/// What a rule is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAnchor {
    Parent,
    /// A sibling, by view id
    Sibling(i32),
}

/// Pending layout params, set up when the widget learns its parent and
/// refined by `layout_*` attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutParams {
    pub width: Dimension,
    pub height: Dimension,
    pub rules: IndexMap<RelativeRule, RuleAnchor>,
}

/// Mutable view properties.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// View id allocated by the session's id generator.
    pub id: Option<i32>,
    pub parent: Option<WidgetId>,
    pub layout_params: Option<LayoutParams>,
    pub visibility: Visibility,
    pub padding: i32,
    pub background: Option<String>,
    pub enabled: bool,
    pub alpha: f32,
    pub focusable: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            id: None,
            parent: None,
            layout_params: None,
            visibility: Visibility::Visible,
            padding: 0,
            background: None,
            enabled: true,
            alpha: 1.0,
            focusable: true,
        }
    }
}

/// Headless stand-in for a native view handle.
pub struct View {
    widget_id: WidgetId,
    kind: &'static str,
    manager: ManagerSlot,
    state: Mutex<ViewState>,
    children: Mutex<Vec<WidgetRef>>,
}

impl View {
    pub fn new(kind: &'static str) -> Self {
        Self {
            widget_id: next_widget_id(),
            kind,
            manager: ManagerSlot::new(),
            state: Mutex::new(ViewState::default()),
            children: Mutex::new(Vec::new()),
        }
    }

    pub fn widget_id(&self) -> WidgetId {
        self.widget_id
    }

    /// Widget kind, usually the registry key of the parser that built it.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn manager_slot(&self) -> &ManagerSlot {
        &self.manager
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Copy of the current properties.
    pub fn snapshot(&self) -> ViewState {
        self.state().clone()
    }

    /// Mutate the properties under the view's lock.
    pub fn update<R>(&self, f: impl FnOnce(&mut ViewState) -> R) -> R {
        f(&mut self.state())
    }

    pub fn id(&self) -> Option<i32> {
        self.state().id
    }

    pub fn set_id(&self, id: i32) {
        self.state().id = Some(id);
    }

    pub fn parent(&self) -> Option<WidgetId> {
        self.state().parent
    }

    /// Record the parent and give the view default layout params.
    pub fn attach_to(&self, parent: Option<&WidgetRef>) {
        let mut state = self.state();
        state.parent = parent.map(|p| p.as_view().widget_id());
        if parent.is_some() && state.layout_params.is_none() {
            state.layout_params = Some(LayoutParams::default());
        }
    }

    /// Mutate the layout params, creating defaults if none are pending yet.
    pub fn update_layout_params(&self, f: impl FnOnce(&mut LayoutParams)) {
        let mut state = self.state();
        f(state.layout_params.get_or_insert_with(LayoutParams::default));
    }

    fn children_lock(&self) -> MutexGuard<'_, Vec<WidgetRef>> {
        self.children.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_child(&self, child: WidgetRef) {
        self.children_lock().push(child);
    }

    /// Swap in a new child list, returning the previous one.
    pub fn replace_children(&self, children: Vec<WidgetRef>) -> Vec<WidgetRef> {
        std::mem::replace(&mut *self.children_lock(), children)
    }

    pub fn children(&self) -> Vec<WidgetRef> {
        self.children_lock().clone()
    }

    pub fn child_count(&self) -> usize {
        self.children_lock().len()
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("widget_id", &self.widget_id)
            .field("kind", &self.kind)
            .field("attached", &self.manager.is_attached())
            .field("state", &self.snapshot())
            .field("children", &self.child_count())
            .finish()
    }
}

/// Depth-first search for the widget carrying view id `id`.
pub fn find_view_by_id(root: &WidgetRef, id: i32) -> Option<WidgetRef> {
    if root.as_view().id() == Some(id) {
        return Some(root.clone());
    }
    root.as_view()
        .children()
        .iter()
        .find_map(|child| find_view_by_id(child, id))
}

/// Render a widget tree as indented text, one widget per line.
pub fn describe_tree(root: &WidgetRef, ids: &IdGenerator) -> String {
    let mut buf = String::new();
    describe_into(root, ids, 0, &mut buf);
    buf
}

fn describe_into(widget: &WidgetRef, ids: &IdGenerator, depth: usize, buf: &mut String) {
    let view = widget.as_view();
    let state = view.snapshot();

    buf.push_str(&"  ".repeat(depth));
    buf.push_str(view.kind());
    buf.push(' ');
    buf.push_str(&view.widget_id().to_string());

    if let Some(id) = state.id {
        let name = ids.view_name_of(id).unwrap_or_else(|| id.to_string());
        buf.push_str(&format!(" id={}", name));
    }
    if let Some(manager) = widget.view_manager() {
        if manager.data_index() >= 0 {
            buf.push_str(&format!(" index={}", manager.data_index()));
        }
    }
    if state.visibility != Visibility::Visible {
        buf.push_str(&format!(" {:?}", state.visibility).to_lowercase());
    }
    let summary = widget.summary();
    if !summary.is_empty() {
        buf.push(' ');
        buf.push_str(&summary);
    }
    buf.push('\n');

    for child in view.children() {
        describe_into(&child, ids, depth + 1, buf);
    }
}
