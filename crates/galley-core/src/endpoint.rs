//! Seat endpoint allocation.
//!
//! A fixed set of seats registered at construction; NPCs reserve one before
//! walking to it. The registry is an explicit service owned by the engine and
//! passed by reference wherever reservation happens — never global state.

use crate::id::EndpointId;
use crate::vec2::Vec2;

#[derive(Debug, Clone)]
struct Endpoint {
    position: Vec2,
    occupied: bool,
}

/// Fixed endpoint list with an occupancy flag per seat. Never grows or
/// shrinks after construction.
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    endpoints: Vec<Endpoint>,
}

impl EndpointRegistry {
    /// Register one endpoint per position, all free, in the given order.
    /// That order is the reservation scan order.
    pub fn new(positions: &[Vec2]) -> Self {
        Self {
            endpoints: positions
                .iter()
                .map(|&position| Endpoint {
                    position,
                    occupied: false,
                })
                .collect(),
        }
    }

    /// Reserve the first free endpoint in registration order, marking it
    /// occupied. `None` when every seat is taken.
    pub fn reserve_free(&mut self) -> Option<EndpointId> {
        let index = self.endpoints.iter().position(|e| !e.occupied)?;
        self.endpoints[index].occupied = true;
        Some(EndpointId(index as u32))
    }

    /// Mark an endpoint occupied. Idempotent; unknown IDs are ignored.
    pub fn mark_occupied(&mut self, id: EndpointId) {
        if let Some(e) = self.endpoints.get_mut(id.0 as usize) {
            e.occupied = true;
        }
    }

    /// Free an endpoint. Idempotent; unknown IDs are ignored.
    pub fn release(&mut self, id: EndpointId) {
        if let Some(e) = self.endpoints.get_mut(id.0 as usize) {
            e.occupied = false;
        }
    }

    pub fn is_endpoint(&self, id: EndpointId) -> bool {
        (id.0 as usize) < self.endpoints.len()
    }

    pub fn is_occupied(&self, id: EndpointId) -> bool {
        self.endpoints
            .get(id.0 as usize)
            .is_some_and(|e| e.occupied)
    }

    pub fn any_free(&self) -> bool {
        self.endpoints.iter().any(|e| !e.occupied)
    }

    pub fn position(&self, id: EndpointId) -> Option<Vec2> {
        self.endpoints.get(id.0 as usize).map(|e| e.position)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn occupied_count(&self) -> usize {
        self.endpoints.iter().filter(|e| e.occupied).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(n: usize) -> EndpointRegistry {
        let positions: Vec<Vec2> = (0..n)
            .map(|i| Vec2::from_f64(i as f64, 0.0))
            .collect();
        EndpointRegistry::new(&positions)
    }

    #[test]
    fn reserve_scans_in_registration_order() {
        let mut reg = registry(3);
        assert_eq!(reg.reserve_free(), Some(EndpointId(0)));
        assert_eq!(reg.reserve_free(), Some(EndpointId(1)));
        assert_eq!(reg.reserve_free(), Some(EndpointId(2)));
        assert_eq!(reg.reserve_free(), None);
    }

    #[test]
    fn released_endpoint_is_reused_first() {
        let mut reg = registry(3);
        reg.reserve_free();
        reg.reserve_free();
        reg.release(EndpointId(0));
        assert_eq!(reg.reserve_free(), Some(EndpointId(0)));
    }

    #[test]
    fn release_is_idempotent() {
        let mut reg = registry(2);
        reg.reserve_free();
        reg.release(EndpointId(0));
        reg.release(EndpointId(0));
        assert_eq!(reg.occupied_count(), 0);
    }

    #[test]
    fn mark_occupied_is_idempotent() {
        let mut reg = registry(2);
        reg.mark_occupied(EndpointId(1));
        reg.mark_occupied(EndpointId(1));
        assert_eq!(reg.occupied_count(), 1);
        assert!(reg.is_occupied(EndpointId(1)));
    }

    #[test]
    fn unknown_id_is_ignored() {
        let mut reg = registry(1);
        reg.mark_occupied(EndpointId(9));
        reg.release(EndpointId(9));
        assert!(!reg.is_endpoint(EndpointId(9)));
        assert_eq!(reg.occupied_count(), 0);
    }

    #[test]
    fn occupancy_conservation() {
        let mut reg = registry(4);
        let a = reg.reserve_free().unwrap();
        let b = reg.reserve_free().unwrap();
        assert_eq!(reg.occupied_count(), 2);
        reg.release(a);
        assert_eq!(reg.occupied_count(), 1);
        reg.release(b);
        assert_eq!(reg.occupied_count(), 0);
        assert!(reg.any_free());
    }
}
