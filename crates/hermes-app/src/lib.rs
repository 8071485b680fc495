// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod badge;
pub mod forms;
pub mod grid;
pub mod ids;
pub mod model;
pub mod notification;
pub mod page;
pub mod presenter;
pub mod repository;
pub mod route;
pub mod state;

pub use badge::*;
pub use forms::*;
pub use grid::*;
pub use ids::*;
pub use model::*;
pub use notification::*;
pub use page::*;
pub use presenter::*;
pub use repository::*;
pub use route::*;
pub use state::*;
