//! Dependency ordering over the outgoing connections of a [`RoomGraph`].
//!
//! Depth-first traversal with an explicit work stack, started once per
//! unvisited room in ascending id order. The processing order is the
//! reverse of the finish order, so on an acyclic graph every room comes
//! after all of its upstream neighbours.
//!
//! A connection that reaches a room still on the traversal stack closes a
//! cycle. The strict order rejects it; the feedback order records it as a
//! back edge and carries on.

use crate::graph::{GraphError, RoomGraph};
use crate::id::{ConnectionId, RoomId};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the traversal stack; its subtree is not finished.
    Active,
    Finished,
}

/// A processing order that tolerates cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackOrder {
    /// Every room exactly once.
    pub order: Vec<RoomId>,
    /// Connections whose destination precedes their origin in `order`.
    pub back_edges: Vec<ConnectionId>,
}

impl RoomGraph {
    /// Processing order in which each room follows its upstream neighbours.
    ///
    /// Returns [`GraphError::CycleDetected`] naming the room a cycle closes
    /// on if the graph is not acyclic.
    pub fn dependency_order(&self) -> Result<Vec<RoomId>, GraphError> {
        self.depth_first(|_, room| Err(GraphError::CycleDetected { room }))
    }

    /// Processing order that never fails. On a cyclic graph some rooms read
    /// an upstream neighbour before it has been updated; those connections
    /// are listed in [`FeedbackOrder::back_edges`].
    pub fn dependency_order_with_feedback(&self) -> FeedbackOrder {
        let mut back_edges = Vec::new();
        let order = self
            .depth_first(|connection, _| {
                back_edges.push(connection);
                Ok(())
            })
            .unwrap_or_default();
        FeedbackOrder { order, back_edges }
    }

    fn depth_first<F>(&self, mut on_back_edge: F) -> Result<Vec<RoomId>, GraphError>
    where
        F: FnMut(ConnectionId, RoomId) -> Result<(), GraphError>,
    {
        let mut marks: BTreeMap<RoomId, Mark> = BTreeMap::new();
        let mut finished: Vec<RoomId> = Vec::with_capacity(self.room_count());
        // (room, index of the next outgoing connection to follow)
        let mut stack: Vec<(RoomId, usize)> = Vec::new();

        for &root in self.rooms().keys() {
            if marks.contains_key(&root) {
                continue;
            }
            marks.insert(root, Mark::Active);
            stack.push((root, 0));

            while let Some(top) = stack.last_mut() {
                let (room, next) = *top;
                let outgoing = self.outgoing_ids(room);

                let Some(&connection) = outgoing.get(next) else {
                    stack.pop();
                    marks.insert(room, Mark::Finished);
                    finished.push(room);
                    continue;
                };
                top.1 += 1;

                let Some(target) = self.connection(connection).map(|c| c.to) else {
                    continue;
                };
                match marks.get(&target).copied() {
                    None => {
                        marks.insert(target, Mark::Active);
                        stack.push((target, 0));
                    }
                    Some(Mark::Active) => on_back_edge(connection, target)?,
                    Some(Mark::Finished) => {}
                }
            }
        }

        finished.reverse();
        Ok(finished)
    }
}
