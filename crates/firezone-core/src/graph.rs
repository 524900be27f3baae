use crate::id::{ConnectionId, RoomId};
use crate::room::Room;
use slotmap::SlotMap;
use std::collections::BTreeMap;
use tracing::debug;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during graph operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("{0} already exists in the graph")]
    DuplicateRoomId(RoomId),
    #[error("connection {from} -> {to} references unknown {missing}")]
    UnknownRoomReference {
        from: RoomId,
        to: RoomId,
        missing: RoomId,
    },
    #[error("{0} not found")]
    RoomNotFound(RoomId),
    #[error("cycle detected in room graph at {room}")]
    CycleDetected { room: RoomId },
}

// ---------------------------------------------------------------------------
// Core data structures
// ---------------------------------------------------------------------------

/// Adjacency lists for a single room, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
struct RoomAdjacency {
    /// Connections whose destination is this room.
    incoming: Vec<ConnectionId>,
    /// Connections whose origin is this room.
    outgoing: Vec<ConnectionId>,
}

/// A directed, weighted link between two rooms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    pub from: RoomId,
    pub to: RoomId,
    /// How strongly upstream hazard carries over, nominally in `[0, 1]`.
    pub strength: f64,
}

// ---------------------------------------------------------------------------
// RoomGraph
// ---------------------------------------------------------------------------

/// Rooms keyed by id plus directed connections between them.
///
/// Connections live in a `SlotMap`; each room's adjacency keeps the incoming
/// and outgoing projections as mirror images. Parallel connections between
/// the same pair are kept separately. The graph may contain cycles.
#[derive(Debug, Clone, Default)]
pub struct RoomGraph {
    rooms: BTreeMap<RoomId, Room>,
    connections: SlotMap<ConnectionId, Connection>,
    adjacency: BTreeMap<RoomId, RoomAdjacency>,
}

impl RoomGraph {
    /// Create a new, empty room graph.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Add a room. Fails without touching the graph if the id is taken.
    ///
    /// # Examples
    ///
    /// ```
    /// use firezone_core::graph::{GraphError, RoomGraph};
    /// use firezone_core::id::RoomId;
    /// use firezone_core::room::{InitialParameters, Room};
    /// # fn params() -> InitialParameters {
    /// #     InitialParameters {
    /// #         heat_of_combustion: 13800.0,
    /// #         linear_flame_speed_rate: 0.0108,
    /// #         specific_fuel_burn_rate: 0.0145,
    /// #         smoke_forming_ability: 270.0,
    /// #         combustion_completeness_coefficient: 0.87,
    /// #         heat_absorption_coefficient: 0.95,
    /// #         start_temperature: 293.0,
    /// #         initial_gas_density: 1.21,
    /// #         specific_heat_capacity: 1.03,
    /// #         room_volume: 270.0,
    /// #     }
    /// # }
    ///
    /// let mut graph = RoomGraph::new();
    /// graph.add_room(Room::source(RoomId(1), params())).unwrap();
    /// let again = graph.add_room(Room::new(RoomId(1), params()));
    /// assert_eq!(again, Err(GraphError::DuplicateRoomId(RoomId(1))));
    /// ```
    pub fn add_room(&mut self, room: Room) -> Result<(), GraphError> {
        let id = room.id();
        if self.rooms.contains_key(&id) {
            return Err(GraphError::DuplicateRoomId(id));
        }
        debug!(room = id.0, source = room.is_gas_source(), "room added");
        self.adjacency.insert(id, RoomAdjacency::default());
        self.rooms.insert(id, room);
        Ok(())
    }

    /// Connect `from` to `to`. Both rooms must already exist; on failure
    /// neither projection changes.
    ///
    /// # Examples
    ///
    /// ```
    /// use firezone_core::graph::RoomGraph;
    /// use firezone_core::id::RoomId;
    /// use firezone_core::room::{InitialParameters, Room};
    /// # fn params() -> InitialParameters {
    /// #     InitialParameters {
    /// #         heat_of_combustion: 13800.0,
    /// #         linear_flame_speed_rate: 0.0108,
    /// #         specific_fuel_burn_rate: 0.0145,
    /// #         smoke_forming_ability: 270.0,
    /// #         combustion_completeness_coefficient: 0.87,
    /// #         heat_absorption_coefficient: 0.95,
    /// #         start_temperature: 293.0,
    /// #         initial_gas_density: 1.21,
    /// #         specific_heat_capacity: 1.03,
    /// #         room_volume: 270.0,
    /// #     }
    /// # }
    ///
    /// let mut graph = RoomGraph::new();
    /// graph.add_room(Room::source(RoomId(1), params())).unwrap();
    /// graph.add_room(Room::new(RoomId(2), params())).unwrap();
    /// graph.add_connection(RoomId(1), RoomId(2), 0.2).unwrap();
    ///
    /// assert_eq!(graph.outgoing(RoomId(1)).collect::<Vec<_>>(), vec![(RoomId(2), 0.2)]);
    /// assert_eq!(graph.incoming(RoomId(2)).collect::<Vec<_>>(), vec![(RoomId(1), 0.2)]);
    /// ```
    pub fn add_connection(
        &mut self,
        from: RoomId,
        to: RoomId,
        strength: f64,
    ) -> Result<ConnectionId, GraphError> {
        for id in [from, to] {
            if !self.rooms.contains_key(&id) {
                return Err(GraphError::UnknownRoomReference {
                    from,
                    to,
                    missing: id,
                });
            }
        }

        let connection_id = self.connections.insert(Connection { from, to, strength });
        if let Some(adj) = self.adjacency.get_mut(&from) {
            adj.outgoing.push(connection_id);
        }
        if let Some(adj) = self.adjacency.get_mut(&to) {
            adj.incoming.push(connection_id);
        }

        debug!(from = from.0, to = to.0, strength, "connection added");
        Ok(connection_id)
    }

    /// Flag `id` as the fire source and clear the flag everywhere else.
    pub fn set_source(&mut self, id: RoomId) -> Result<(), GraphError> {
        if !self.rooms.contains_key(&id) {
            return Err(GraphError::RoomNotFound(id));
        }
        for (room_id, room) in &mut self.rooms {
            room.set_gas_source(*room_id == id);
        }
        Ok(())
    }

    pub(crate) fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(&id)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// All rooms, ordered by id. Read-only view for reporting.
    pub fn rooms(&self) -> &BTreeMap<RoomId, Room> {
        &self.rooms
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    pub fn contains_room(&self, id: RoomId) -> bool {
        self.rooms.contains_key(&id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    /// Upstream neighbours of `id` as `(from, strength)`, in insertion order.
    pub fn incoming(&self, id: RoomId) -> impl Iterator<Item = (RoomId, f64)> + '_ {
        self.incoming_ids(id)
            .iter()
            .filter_map(|&cid| self.connections.get(cid).map(|c| (c.from, c.strength)))
    }

    /// Downstream neighbours of `id` as `(to, strength)`, in insertion order.
    pub fn outgoing(&self, id: RoomId) -> impl Iterator<Item = (RoomId, f64)> + '_ {
        self.outgoing_ids(id)
            .iter()
            .filter_map(|&cid| self.connections.get(cid).map(|c| (c.to, c.strength)))
    }

    pub fn incoming_ids(&self, id: RoomId) -> &[ConnectionId] {
        self.adjacency
            .get(&id)
            .map(|adj| adj.incoming.as_slice())
            .unwrap_or(&[])
    }

    pub fn outgoing_ids(&self, id: RoomId) -> &[ConnectionId] {
        self.adjacency
            .get(&id)
            .map(|adj| adj.outgoing.as_slice())
            .unwrap_or(&[])
    }

    /// Ids of every room flagged as a fire source, ascending.
    pub fn source_rooms(&self) -> Vec<RoomId> {
        self.rooms
            .values()
            .filter(|room| room.is_gas_source())
            .map(Room::id)
            .collect()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}
