//! The task layer every parallel loop in the workspace goes through.
//!
//! With the `parallel` feature (the default) work is dispatched to rayon's
//! work-stealing pool; without it the same closures run sequentially on the
//! calling thread, which is the reproducible single-threaded mode. Callers
//! never talk to rayon directly, so the fallback is a feature switch rather
//! than a code path.

use core::ops::Range;

/// Partitions `[0, total_work)` into ranges of at most `grain` items and
/// runs `task` on each, possibly concurrently. Returns after all ranges
/// complete (fork/join semantics).
pub fn parallel_for<F>(total_work: usize, grain: usize, task: F)
where
    F: Fn(Range<usize>) + Send + Sync,
{
    let grain = grain.max(1);
    if total_work == 0 {
        return;
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        let n_ranges = total_work.div_ceil(grain);
        (0..n_ranges).into_par_iter().for_each(|i| {
            let start = i * grain;
            task(start..(start + grain).min(total_work));
        });
    }

    #[cfg(not(feature = "parallel"))]
    {
        let mut start = 0;
        while start < total_work {
            let end = (start + grain).min(total_work);
            task(start..end);
            start = end;
        }
    }
}

/// Runs `task(start_index, chunk)` over disjoint chunks of `data` of at most
/// `grain` elements.
pub fn parallel_for_each_chunk<T, F>(data: &mut [T], grain: usize, task: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    let grain = grain.max(1);

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        data.par_chunks_mut(grain)
            .enumerate()
            .for_each(|(i, chunk)| task(i * grain, chunk));
    }

    #[cfg(not(feature = "parallel"))]
    {
        for (i, chunk) in data.chunks_mut(grain).enumerate() {
            task(i * grain, chunk);
        }
    }
}

/// Maps `op` over `0..n` and collects the results in order.
pub fn parallel_map<T, F>(n: usize, op: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Send + Sync,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        (0..n).into_par_iter().map(op).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        (0..n).map(op).collect()
    }
}
