// Domain layer: core models, defaults and ports (collaborator interfaces).

pub mod defaults;
pub mod model;
pub mod ports;
