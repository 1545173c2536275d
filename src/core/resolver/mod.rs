mod dependency;

pub use dependency::{
    DependencyResolver, ResolverOptions, DEFAULT_MAX_NODES, DEFAULT_REQUEST_TIMEOUT,
};
