#![feature(test)]
extern crate test;

use rand::SeedableRng;


fn bench_rng() -> rand::rngs::SmallRng {
    SeedableRng::seed_from_u64(0x0123_4567_89ab_cdef_u64)
}
