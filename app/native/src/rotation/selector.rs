//! Picks the next image of the active album.

use rand::Rng;

/// Returns the index of the next image to show.
///
/// Sequential mode advances from the most recently shown index and wraps.
/// Shuffle mode picks uniformly among indices not yet shown this cycle; once
/// every index has been shown it only avoids an immediate repeat.
///
/// # Arguments
///
/// * `images` - The active album's images
/// * `recent` - Indices shown in the current cycle, oldest first
/// * `shuffle` - Whether to pick randomly
/// * `rng` - Random source, only used in shuffle mode
///
/// # Returns
///
/// `None` if `images` is empty.
pub fn next_index<T, R>(images: &[T], recent: &[usize], shuffle: bool, rng: &mut R) -> Option<usize>
where R: Rng + ?Sized {
    let len = images.len();
    if len == 0 {
        return None;
    }

    let last = recent.last().copied();

    if !shuffle {
        return Some(last.map_or(0, |i| (i % len + 1) % len));
    }

    let unused: Vec<usize> = (0..len).filter(|i| !recent.contains(i)).collect();
    if !unused.is_empty() {
        return Some(unused[rng.random_range(0..unused.len())]);
    }

    if len == 1 {
        return Some(0);
    }
    let candidates: Vec<usize> = (0..len).filter(|&i| Some(i) != last).collect();
    Some(candidates[rng.random_range(0..candidates.len())])
}

/// Records `index` as shown.
///
/// When the history would cover the whole album, it resets to just `index`
/// so the next cycle starts fresh without repeating it immediately.
pub fn record_shown(recent: &mut Vec<usize>, index: usize, album_len: usize) {
    recent.push(index);
    if recent.len() >= album_len {
        recent.clear();
        recent.push(index);
    }
}
