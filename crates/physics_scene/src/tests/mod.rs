//! Scenario tests driving a whole [`SceneRoot`](crate::SceneRoot)

mod end_to_end;
mod lifecycle;
