//! Time-ordered push ids: 8 characters of millisecond timestamp followed by
//! 12 random characters. Ids generated in the same millisecond increment the
//! random tail, so lexical order matches creation order.

use parking_lot::Mutex;
use rand::Rng;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

pub struct PushIdGenerator {
    state: Mutex<(i64, [u8; 12])>,
}

impl Default for PushIdGenerator {
    fn default() -> Self {
        Self {
            state: Mutex::new((0, [0; 12])),
        }
    }
}

impl PushIdGenerator {
    pub fn next_id(&self) -> String {
        self.next_at(estate_shared::now_millis())
    }

    fn next_at(&self, now: i64) -> String {
        let mut state = self.state.lock();
        let (last, tail) = &mut *state;

        if now > *last {
            *last = now;
            let mut rng = rand::rng();
            for slot in tail.iter_mut() {
                *slot = rng.random_range(0..64u8);
            }
        } else {
            // Same millisecond or a clock step backwards: stay on the last
            // timestamp and bump the tail.
            for slot in tail.iter_mut().rev() {
                if *slot == 63 {
                    *slot = 0;
                } else {
                    *slot += 1;
                    break;
                }
            }
        }

        let mut id = [0u8; 20];
        let mut t = *last;
        for i in (0..8).rev() {
            id[i] = PUSH_CHARS[(t % 64) as usize];
            t /= 64;
        }
        for (i, &r) in tail.iter().enumerate() {
            id[8 + i] = PUSH_CHARS[r as usize];
        }
        id.iter().map(|&b| b as char).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_sort_in_creation_order() {
        let gen = PushIdGenerator::default();
        let ids: Vec<String> = (0..200).map(|_| gen.next_at(1_700_000_000_000)).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);

        let later = gen.next_at(1_700_000_000_001);
        assert!(later > ids[199]);
    }

    #[test]
    fn clock_going_backwards_keeps_order() {
        let gen = PushIdGenerator::default();
        let a = gen.next_at(2_000);
        let b = gen.next_at(1_000);
        assert!(b > a);
        assert_eq!(a.len(), 20);
        assert!(estate_shared::utils::is_valid_key_segment(&b));
    }
}
