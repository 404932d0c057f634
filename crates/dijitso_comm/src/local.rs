//! An in-process communicator over threads.
//!
//! Useful for programs that drive one builder and several worker threads
//! within a single process, and for exercising role assignment in tests
//! without an MPI runtime. Collective calls rendezvous through a
//! generation-counted exchange: all members must call the same collectives
//! in the same order, as with any communicator.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use crate::communicator::Communicator;
use crate::error::CommError;

/// One member's endpoint of an in-process group.
pub struct LocalComm {
    rank: usize,
    split_calls: AtomicU64,
    shared: Arc<Shared>,
}

struct Shared {
    size: usize,
    state: Mutex<RoundState>,
    cv: Condvar,
    subgroups: Mutex<HashMap<(u64, usize), Arc<Shared>>>,
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum Phase {
    Filling,
    Draining,
}

struct RoundState {
    phase: Phase,
    round: u64,
    arrived: usize,
    departed: usize,
    slots: Vec<Option<Vec<u8>>>,
    result: Arc<Vec<Vec<u8>>>,
}

impl Shared {
    fn new(size: usize) -> Self {
        Self {
            size,
            state: Mutex::new(RoundState {
                phase: Phase::Filling,
                round: 0,
                arrived: 0,
                departed: 0,
                slots: vec![None; size],
                result: Arc::new(Vec::new()),
            }),
            cv: Condvar::new(),
            subgroups: Mutex::new(HashMap::new()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RoundState> {
        // A poisoned lock means a sibling thread panicked mid-collective;
        // the state itself is still structurally sound.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LocalComm {
    /// Creates a group of `size` endpoints, one per participating thread.
    pub fn group(size: usize) -> Vec<LocalComm> {
        assert!(size > 0, "communicator group must have at least one member");
        let shared = Arc::new(Shared::new(size));
        (0..size)
            .map(|rank| LocalComm {
                rank,
                split_calls: AtomicU64::new(0),
                shared: Arc::clone(&shared),
            })
            .collect()
    }

    /// The rendezvous at the heart of every collective: each member
    /// deposits its buffer, the last arrival snapshots the round, and all
    /// members leave with the same indexed result.
    fn exchange(&self, data: &[u8]) -> Vec<Vec<u8>> {
        let shared = &self.shared;
        let mut st = shared.lock_state();

        // A previous round may still be draining; wait for a fresh one.
        while st.phase == Phase::Draining {
            st = shared.cv.wait(st).unwrap_or_else(|e| e.into_inner());
        }

        let my_round = st.round;
        st.slots[self.rank] = Some(data.to_vec());
        st.arrived += 1;

        if st.arrived == shared.size {
            let collected: Vec<Vec<u8>> = st
                .slots
                .iter_mut()
                .map(|slot| slot.take().unwrap_or_default())
                .collect();
            st.result = Arc::new(collected);
            st.phase = Phase::Draining;
            st.departed = 0;
            shared.cv.notify_all();
        } else {
            while !(st.phase == Phase::Draining && st.round == my_round) {
                st = shared.cv.wait(st).unwrap_or_else(|e| e.into_inner());
            }
        }

        let result = Arc::clone(&st.result);
        st.departed += 1;
        if st.departed == shared.size {
            st.phase = Phase::Filling;
            st.round = st.round.wrapping_add(1);
            st.arrived = 0;
            shared.cv.notify_all();
        }
        drop(st);

        (*result).clone()
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn barrier(&self) -> Result<(), CommError> {
        self.exchange(&[]);
        Ok(())
    }

    fn split(&self, color: usize) -> Result<Box<dyn Communicator>, CommError> {
        let seq = self.split_calls.fetch_add(1, Ordering::Relaxed);

        let gathered = self.exchange(&(color as u64).to_le_bytes());
        let colors: Vec<usize> = gathered
            .iter()
            .map(|bytes| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&bytes[..8]);
                u64::from_le_bytes(buf) as usize
            })
            .collect();

        let members: Vec<usize> = (0..self.shared.size)
            .filter(|rank| colors[*rank] == color)
            .collect();
        let new_rank = members
            .iter()
            .position(|rank| *rank == self.rank)
            .expect("split member list must contain the caller");

        let mut groups = self
            .shared
            .subgroups
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let child = groups
            .entry((seq, color))
            .or_insert_with(|| Arc::new(Shared::new(members.len())));
        let child = Arc::clone(child);
        drop(groups);

        Ok(Box::new(LocalComm {
            rank: new_rank,
            split_calls: AtomicU64::new(0),
            shared: child,
        }))
    }

    fn allgather(&self, data: &[u8]) -> Result<Vec<Vec<u8>>, CommError> {
        Ok(self.exchange(data))
    }

    fn broadcast(&self, data: &[u8], root: usize) -> Result<Vec<u8>, CommError> {
        let gathered = self.exchange(data);
        gathered
            .get(root)
            .cloned()
            .ok_or_else(|| CommError::Transport(format!("broadcast root {root} out of range")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn run_group<F, T>(size: usize, body: F) -> Vec<T>
    where
        F: Fn(LocalComm) -> T + Send + Sync + 'static,
        T: Send + 'static,
    {
        let body = Arc::new(body);
        let mut handles = Vec::new();
        for comm in LocalComm::group(size) {
            let body = Arc::clone(&body);
            handles.push(thread::spawn(move || body(comm)));
        }
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    }

    #[test]
    fn single_member_group() {
        let comm = LocalComm::group(1).pop().unwrap();
        assert_eq!(comm.rank(), 0);
        assert_eq!(comm.size(), 1);
        comm.barrier().unwrap();
        assert_eq!(comm.allgather(b"solo").unwrap(), vec![b"solo".to_vec()]);
    }

    #[test]
    fn allgather_indexes_by_rank() {
        let results = run_group(4, |comm| {
            let data = vec![comm.rank() as u8];
            comm.allgather(&data).unwrap()
        });
        for gathered in results {
            assert_eq!(gathered, vec![vec![0u8], vec![1], vec![2], vec![3]]);
        }
    }

    #[test]
    fn broadcast_returns_root_bytes() {
        let results = run_group(3, |comm| {
            let data = format!("from-{}", comm.rank());
            comm.broadcast(data.as_bytes(), 1).unwrap()
        });
        for received in results {
            assert_eq!(received, b"from-1".to_vec());
        }
    }

    #[test]
    fn repeated_collectives_reuse_the_group() {
        let results = run_group(3, |comm| {
            let mut seen = Vec::new();
            for round in 0..10u8 {
                let gathered = comm.allgather(&[round, comm.rank() as u8]).unwrap();
                seen.push(gathered);
                comm.barrier().unwrap();
            }
            seen
        });
        for per_member in results {
            assert_eq!(per_member.len(), 10);
            for (round, gathered) in per_member.iter().enumerate() {
                for (rank, buf) in gathered.iter().enumerate() {
                    assert_eq!(buf, &vec![round as u8, rank as u8]);
                }
            }
        }
    }

    #[test]
    fn split_by_parity() {
        let results = run_group(5, |comm| {
            let sub = comm.split(comm.rank() % 2).unwrap();
            let gathered = sub.allgather(&[comm.rank() as u8]).unwrap();
            (comm.rank(), sub.rank(), sub.size(), gathered)
        });

        for (rank, sub_rank, sub_size, gathered) in results {
            if rank % 2 == 0 {
                // Members 0, 2, 4.
                assert_eq!(sub_size, 3);
                assert_eq!(sub_rank, rank / 2);
                assert_eq!(gathered, vec![vec![0u8], vec![2], vec![4]]);
            } else {
                // Members 1, 3.
                assert_eq!(sub_size, 2);
                assert_eq!(sub_rank, rank / 2);
                assert_eq!(gathered, vec![vec![1u8], vec![3]]);
            }
        }
    }

    #[test]
    fn sequential_splits_are_independent() {
        let results = run_group(4, |comm| {
            let first = comm.split(comm.rank() % 2).unwrap();
            let second = comm.split(0).unwrap();
            (first.size(), second.size())
        });
        for (first_size, second_size) in results {
            assert_eq!(first_size, 2);
            assert_eq!(second_size, 4);
        }
    }
}
