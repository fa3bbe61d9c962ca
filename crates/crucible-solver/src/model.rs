//! Model construction.
//!
//! A model is the search-facing description of a problem: the ordered
//! decision variables, the root constraint (always a conjunction), an
//! optional objective, and the flattened neighbourhood catalogue with its
//! variable mapping. The expression graph itself is built through
//! [`ModelBuilder::graph_mut`] and handed back alongside the model.

use crucible_core::{CoreError, Domain, Result, Value};
use crucible_engine::{Graph, NodeId};

use crate::neighbourhood::{generate_neighbourhoods, Neighbourhood};

/// Direction of the objective expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimiseMode {
    None,
    Minimise,
    Maximise,
}

/// One decision variable.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub domain: Domain,
    /// The variable's leaf node.
    pub node: NodeId,
}

/// A built, immutable search model.
#[derive(Debug)]
pub struct Model {
    pub variables: Vec<Variable>,
    /// Root constraint node; a conjunction of everything posted.
    pub constraint: NodeId,
    pub optimise: OptimiseMode,
    pub objective: Option<NodeId>,
    pub neighbourhoods: Vec<Neighbourhood>,
}

impl Model {
    /// The variable a neighbourhood mutates.
    pub fn neighbourhood_var(&self, index: usize) -> &Variable {
        &self.variables[self.neighbourhoods[index].var]
    }
}

/// Builds a [`Model`] and its expression graph.
#[derive(Debug, Default)]
pub struct ModelBuilder {
    graph: Graph,
    variables: Vec<Variable>,
    constraints: Vec<NodeId>,
    optimise: OptimiseMode,
    objective: Option<NodeId>,
}

impl Default for OptimiseMode {
    fn default() -> OptimiseMode {
        OptimiseMode::None
    }
}

impl ModelBuilder {
    pub fn new() -> ModelBuilder {
        ModelBuilder::default()
    }

    /// The graph under construction, for building constraint expressions
    /// over the variables added so far.
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// Registers a decision variable with its initial assignment.
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        domain: Domain,
        initial: Value,
    ) -> NodeId {
        let node = self.graph.add_variable(initial);
        self.variables.push(Variable {
            name: name.into(),
            domain,
            node,
        });
        node
    }

    /// Registers a constant leaf: it shares the variable registration path
    /// but is invisible to search (no neighbourhoods, never selected).
    pub fn add_constant(&mut self, value: Value) -> NodeId {
        self.graph.add_variable(value)
    }

    /// Posts a constraint; all posted constraints are conjoined at build.
    pub fn post(&mut self, constraint: NodeId) {
        self.constraints.push(constraint);
    }

    pub fn minimise(&mut self, objective: NodeId) {
        self.optimise = OptimiseMode::Minimise;
        self.objective = Some(objective);
    }

    pub fn maximise(&mut self, objective: NodeId) {
        self.optimise = OptimiseMode::Maximise;
        self.objective = Some(objective);
    }

    /// Finalises the model: conjoins the posted constraints into the root
    /// node and generates the neighbourhood catalogue per variable.
    pub fn build(mut self) -> Result<(Model, Graph)> {
        if self.variables.is_empty() {
            return Err(CoreError::Model("model has no variables".into()));
        }
        if self.constraints.is_empty() {
            return Err(CoreError::Model("model has no constraints".into()));
        }
        let constraint = self.graph.and(self.constraints);
        let mut neighbourhoods = Vec::new();
        for (index, var) in self.variables.iter().enumerate() {
            generate_neighbourhoods(index, &var.name, &var.domain, &mut neighbourhoods);
        }
        if neighbourhoods.is_empty() {
            return Err(CoreError::Model(
                "no variable generated any neighbourhood".into(),
            ));
        }
        tracing::debug!(
            variables = self.variables.len(),
            neighbourhoods = neighbourhoods.len(),
            "model built"
        );
        Ok((
            Model {
                variables: self.variables,
                constraint,
                optimise: self.optimise,
                objective: self.objective,
                neighbourhoods,
            },
            self.graph,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crucible_core::value::IntValue;
    use crucible_core::IntDomain;

    #[test]
    fn build_conjoins_constraints_and_generates_moves() {
        let mut b = ModelBuilder::new();
        let x = b.add_variable(
            "x",
            Domain::Int(IntDomain::range(0, 9).unwrap()),
            Value::Int(IntValue::new(0)),
        );
        let y = b.add_variable(
            "y",
            Domain::Int(IntDomain::range(0, 9).unwrap()),
            Value::Int(IntValue::new(3)),
        );
        let c = b.graph_mut().eq(x, y);
        b.post(c);
        let (model, graph) = b.build().unwrap();
        assert_eq!(model.variables.len(), 2);
        // two int generators per variable
        assert_eq!(model.neighbourhoods.len(), 4);
        assert_eq!(graph.view(model.constraint).violation(), Some(3));
        assert_eq!(model.neighbourhood_var(0).name, "x");
    }

    #[test]
    fn empty_models_are_rejected() {
        assert!(ModelBuilder::new().build().is_err());
        let mut b = ModelBuilder::new();
        b.add_variable(
            "x",
            Domain::Int(IntDomain::range(0, 1).unwrap()),
            Value::Int(IntValue::new(0)),
        );
        assert!(b.build().is_err());
    }
}
