use crate::error::ClearError;
use crate::types::{Tool, ToolOrder, ToolRole};
use std::cmp::Ordering;

/// Arrange the tool pool into processing order.
///
/// Rest machining always runs largest to smallest and ignores the requested
/// order: a smaller tool must never precede a larger one, or the leftover
/// bookkeeping falls apart. Otherwise the requested order applies, with
/// Isolation-role tools moved ahead of Clear-role tools because isolation
/// passes logically precede area clearing.
pub fn plan_tool_order(tools: &[Tool], order: ToolOrder, rest_machining: bool) -> Vec<Tool> {
    let mut planned: Vec<Tool> = tools.to_vec();

    if rest_machining {
        planned.sort_by(|a, b| {
            b.diameter
                .partial_cmp(&a.diameter)
                .unwrap_or(Ordering::Equal)
        });
        return planned;
    }

    match order {
        ToolOrder::Default => {}
        ToolOrder::Forward => planned.sort_by(|a, b| {
            a.diameter
                .partial_cmp(&b.diameter)
                .unwrap_or(Ordering::Equal)
        }),
        ToolOrder::Reverse => planned.sort_by(|a, b| {
            b.diameter
                .partial_cmp(&a.diameter)
                .unwrap_or(Ordering::Equal)
        }),
    }

    // Stable, so ties keep the order established above.
    planned.sort_by_key(|t| matches!(t.role, ToolRole::Clear));
    planned
}

/// Reject tool pools the engine cannot process sensibly.
pub fn validate_tools(tools: &[Tool]) -> Result<(), ClearError> {
    if tools.is_empty() {
        return Err(ClearError::InvalidTool("tool pool is empty".to_string()));
    }
    for tool in tools {
        if !(tool.diameter > 0.0) {
            return Err(ClearError::InvalidTool(format!(
                "tool '{}' has non-positive diameter {}",
                tool.name, tool.diameter
            )));
        }
        if !(0.0..1.0).contains(&tool.overlap) {
            return Err(ClearError::InvalidTool(format!(
                "tool '{}' has overlap {} outside [0, 1)",
                tool.name, tool.overlap
            )));
        }
    }
    for (i, a) in tools.iter().enumerate() {
        for b in &tools[i + 1..] {
            if (a.diameter - b.diameter).abs() < 1e-9 {
                return Err(ClearError::InvalidTool(format!(
                    "tools '{}' and '{}' share diameter {}",
                    a.name, b.name, a.diameter
                )));
            }
        }
    }
    Ok(())
}
