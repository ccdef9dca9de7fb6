//! Navigation controller.
//!
//! The mounted route graph is a pure function of the session:
//!
//! | Session          | Graph     | Reachable routes |
//! |------------------|-----------|------------------|
//! | Unknown          | `Loading` | none             |
//! | Unauthenticated  | `Guest`   | Welcome, Login   |
//! | Authenticated    | `Member`  | Welcome, Main    |
//!
//! When the graph changes the whole stack is rebuilt and the generation
//! counter moves on, so no back-stack entry survives an authentication flip.

use thiserror::Error;
use tracing::debug;

use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Graph {
    Loading,
    Guest,
    Member,
}

impl Graph {
    pub fn from_session(session: &Session) -> Self {
        match session {
            Session::Unknown => Graph::Loading,
            Session::Unauthenticated => Graph::Guest,
            Session::Authenticated { .. } => Graph::Member,
        }
    }

    pub fn routes(&self) -> &'static [Route] {
        match self {
            Graph::Loading => &[],
            Graph::Guest => &[Route::Welcome, Route::Login],
            Graph::Member => &[Route::Welcome, Route::Main],
        }
    }

    pub fn allows(&self, route: Route) -> bool {
        self.routes().contains(&route)
    }

    /// Stack mounted when this graph becomes active
    fn initial_stack(&self) -> Vec<Route> {
        match self {
            Graph::Loading => Vec::new(),
            Graph::Guest => vec![Route::Welcome],
            // Signed-in users land in the app with Welcome underneath
            Graph::Member => vec![Route::Welcome, Route::Main],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Welcome,
    Login,
    Main,
}

impl Route {
    pub fn title(&self) -> &'static str {
        match self {
            Route::Welcome => "Welcome",
            Route::Login => "Sign in",
            Route::Main => "Main",
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NavigationError {
    #[error("{route:?} is not reachable while {graph:?} is mounted")]
    Unreachable { route: Route, graph: Graph },
}

#[derive(Debug)]
pub struct Navigator {
    graph: Graph,
    generation: u64,
    stack: Vec<Route>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            graph: Graph::Loading,
            generation: 0,
            stack: Vec::new(),
        }
    }

    pub fn graph(&self) -> Graph {
        self.graph
    }

    /// Identity of the mounted tree; bumps on every remount
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current(&self) -> Option<Route> {
        self.stack.last().copied()
    }

    pub fn stack(&self) -> &[Route] {
        &self.stack
    }

    /// Re-derive the graph from the session. Returns true if it remounted.
    pub fn sync(&mut self, session: &Session) -> bool {
        let graph = Graph::from_session(session);
        if graph == self.graph {
            return false;
        }

        self.graph = graph;
        self.generation += 1;
        self.stack = graph.initial_stack();
        debug!(?graph, generation = self.generation, "Remounted navigation tree");
        true
    }

    /// Push a route from the mounted graph. Navigating to the current
    /// route is a no-op.
    pub fn navigate(&mut self, route: Route) -> Result<(), NavigationError> {
        if !self.graph.allows(route) {
            return Err(NavigationError::Unreachable {
                route,
                graph: self.graph,
            });
        }
        if self.current() != Some(route) {
            self.stack.push(route);
        }
        Ok(())
    }

    /// Pop the current route. The root route is never popped.
    pub fn back(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }
}
