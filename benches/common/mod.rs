#![allow(dead_code)]

use alloy_primitives::{Address, I256, U256};
use clmm_v4_client::FastMap;
use clmm_v4_client::math::{
    bit_math, liquidity_amounts, sqrt_price_math, swap_math, tick_bitmap, tick_math,
};
use clmm_v4_client::pool::{PoolKey, PoolState, TickInfo};
use criterion::{BenchmarkId, Criterion, black_box};
use std::str::FromStr;

/// Mainnet-shaped pool with a narrow position and a full-range tail.
pub fn example_pool() -> PoolState {
    let key = PoolKey::new(
        Address::repeat_byte(0x11),
        Address::repeat_byte(0x22),
        3000,
        60,
        Address::ZERO,
    )
    .unwrap();
    PoolState::new(key)
        .with_sqrt_price(U256::from_str("1046706758115479018135889").unwrap())
        .unwrap()
        .with_liquidity(203624297715738503472)
        .with_ticks([
            (
                -224700,
                TickInfo {
                    liquidity_gross: 203624287356963452704,
                    liquidity_net: -203624287356963452704,
                },
            ),
            (
                887220,
                TickInfo {
                    liquidity_gross: 10358775050768,
                    liquidity_net: -10358775050768,
                },
            ),
        ])
        .unwrap()
}

pub fn bench_tick_math(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_math");
    for tick in [-887_272, -224_701, 0, 100_000, 887_272] {
        group.bench_with_input(BenchmarkId::new("get_sqrt_price_at_tick", tick), &tick, |b, &t| {
            b.iter(|| tick_math::get_sqrt_price_at_tick(black_box(t)).unwrap())
        });
    }
    let sqrt_price = tick_math::get_sqrt_price_at_tick(-224_701).unwrap();
    group.bench_function("get_tick_at_sqrt_price", |b| {
        b.iter(|| tick_math::get_tick_at_sqrt_price(black_box(sqrt_price)).unwrap())
    });
    group.finish();
}

pub fn bench_sqrt_price_math(c: &mut Criterion) {
    let sqrt_a = tick_math::get_sqrt_price_at_tick(-600).unwrap();
    let sqrt_b = tick_math::get_sqrt_price_at_tick(600).unwrap();
    let liquidity = 1_000_000_000_000_000_000u128;

    let mut group = c.benchmark_group("sqrt_price_math");
    group.bench_function("get_amount_0_delta", |b| {
        b.iter(|| {
            sqrt_price_math::get_amount_0_delta(black_box(sqrt_a), black_box(sqrt_b), liquidity, true)
                .unwrap()
        })
    });
    group.bench_function("get_amount_1_delta", |b| {
        b.iter(|| {
            sqrt_price_math::get_amount_1_delta(black_box(sqrt_a), black_box(sqrt_b), liquidity, true)
                .unwrap()
        })
    });
    group.bench_function("get_next_sqrt_price_from_input", |b| {
        b.iter(|| {
            sqrt_price_math::get_next_sqrt_price_from_input(
                black_box(sqrt_a),
                liquidity,
                U256::from(1_000_000u64),
                true,
            )
            .unwrap()
        })
    });
    group.finish();
}

pub fn bench_swap_math(c: &mut Criterion) {
    let current = tick_math::get_sqrt_price_at_tick(0).unwrap();
    let target = tick_math::get_sqrt_price_at_tick(-60).unwrap();
    c.bench_function("swap_math/compute_swap_step", |b| {
        b.iter(|| {
            swap_math::compute_swap_step(
                black_box(current),
                black_box(target),
                1_000_000_000_000_000_000,
                I256::from_raw(U256::from(1_000_000_000u64)),
                3000,
            )
            .unwrap()
        })
    });
}

pub fn bench_liquidity_amounts(c: &mut Criterion) {
    let current = tick_math::get_sqrt_price_at_tick(0).unwrap();
    let lower = tick_math::get_sqrt_price_at_tick(-600).unwrap();
    let upper = tick_math::get_sqrt_price_at_tick(600).unwrap();
    let amount = U256::from(1_000_000_000_000_000_000u128);
    c.bench_function("liquidity_amounts/get_liquidity_for_amounts", |b| {
        b.iter(|| {
            liquidity_amounts::get_liquidity_for_amounts(
                black_box(current),
                lower,
                upper,
                black_box(amount),
                black_box(amount),
            )
            .unwrap()
        })
    });
}

pub fn bench_tick_bitmap(c: &mut Criterion) {
    let mut bitmap: FastMap<i16, U256> = FastMap::default();
    for tick in (-6_000..=6_000).step_by(600) {
        tick_bitmap::flip_tick(&mut bitmap, tick, 60).unwrap();
    }
    c.bench_function("tick_bitmap/next_initialized_tick_within_one_word", |b| {
        b.iter(|| {
            tick_bitmap::next_initialized_tick_within_one_word(&bitmap, black_box(30), 60, true)
                .unwrap()
        })
    });
}

pub fn bench_bit_math(c: &mut Criterion) {
    let word = U256::from(0x8000_0000_0001u64);
    c.bench_function("bit_math/most_significant_bit", |b| {
        b.iter(|| bit_math::most_significant_bit(black_box(word)).unwrap())
    });
    c.bench_function("bit_math/least_significant_bit", |b| {
        b.iter(|| bit_math::least_significant_bit(black_box(word)).unwrap())
    });
}
