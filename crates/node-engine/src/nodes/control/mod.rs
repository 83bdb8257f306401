//! Control nodes: comparisons, variables, bounded loops and aggregation

mod aggregate;
mod conditional;
mod loop_items;
mod variable;

pub use aggregate::{aggregate, AggregateOperation};
pub use conditional::{compare, conditional, ConditionOperator};
pub use loop_items::{loop_items, LoopKind};
pub use variable::{variable, VariableScope};
