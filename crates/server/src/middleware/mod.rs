mod model_loaders;

pub use model_loaders::{
    load_milestone_middleware, load_project_middleware, load_task_middleware,
    load_team_middleware,
};
