// Checkbox cascade, drag-and-drop and async loading, printed as JSON events.
use std::time::Instant;

use futures::FutureExt;
use futures::executor::block_on;

use tui_treeselect::{TreeArena, TreeConfig, TreeDefaults, TreeModel, TreeState};

fn main() {
    let mut model = TreeArena::new();
    let docs = model.add_root(Some("docs"), "docs");
    let guide = model.add_child(docs, Some("guide"), "guide");
    model.add_child(guide, Some("intro"), "intro.md");
    model.add_child(guide, Some("setup"), "setup.md");
    let notes = model.add_child(docs, Some("notes"), "notes.md");

    let config = TreeConfig::new().checkable(true).draggable(true);
    let loader = |_node: usize, key: &str| {
        let key = key.to_owned();
        async move {
            println!("loading children of {key}");
            Ok::<(), String>(())
        }
        .boxed()
    };
    let mut state =
        TreeState::with_defaults(&model, config, TreeDefaults::default()).with_loader(loader);

    // One gesture, one event: guide and both files get checked, docs becomes half-checked.
    if let Some(event) = state.check(&model, guide) {
        println!("{}", serde_json::to_string(&event).unwrap_or_default());
    }

    if let Some(outcome) = state.expand(&model, docs) {
        println!("{}", serde_json::to_string(&outcome.event).unwrap_or_default());
        if let Some(load) = outcome.load {
            match block_on(load.finish()) {
                Ok(completion) => state.apply_load_completion(completion),
                Err(err) => eprintln!("{err}"),
            }
        }
    }

    // Drag notes into the gap above guide.
    state.drag_start(&model, notes);
    state.drag_enter(&model, guide, 0.0, 3.0, Instant::now());
    if let Some(event) = state.drop(&model, guide) {
        println!("{}", serde_json::to_string(&event).unwrap_or_default());
        if model.apply_drop(&event) {
            state.invalidate();
        }
    }
    println!("docs children after drop: {:?}", model.children(docs));
}
