//! Kernel programs for the interpreter.
//!
//! Each program performs the same floating-point operations in the same order as
//! the corresponding native kernel, so interpreted output is bit-identical to the
//! compiled variants.

use super::ast::*;
use crate::kernels::hash::{HASH_BLOCK, HASH_SEED};
use crate::kernels::raytrace::{ALBEDO, BACKGROUND, LIGHT_DIR, SPHERE_CENTER, SPHERE_RADIUS};

pub mod matrix {
    use super::*;

    pub const N: Slot = 0;
    pub const I: Slot = 1;
    pub const K: Slot = 2;
    pub const J: Slot = 3;
    pub const AIK: Slot = 4;
    pub const SLOTS: usize = 5;

    pub const A: ArrayId = 0;
    pub const B: ArrayId = 1;
    pub const C: ArrayId = 2;

    pub fn program() -> Vec<Stmt> {
        let at = |row: Slot, col: Slot| var(row) * var(N) + var(col);
        vec![
            set(I, word(0)),
            repeat_while(
                lt(var(I), var(N)),
                vec![
                    set(K, word(0)),
                    repeat_while(
                        lt(var(K), var(N)),
                        vec![
                            set(AIK, idx(A, at(I, K))),
                            set(J, word(0)),
                            repeat_while(
                                lt(var(J), var(N)),
                                vec![
                                    store(C, at(I, J), idx(C, at(I, J)) + var(AIK) * idx(B, at(K, J))),
                                    set(J, var(J) + word(1)),
                                ],
                            ),
                            set(K, var(K) + word(1)),
                        ],
                    ),
                    set(I, var(I) + word(1)),
                ],
            ),
        ]
    }
}

pub mod mandelbrot {
    use super::*;

    pub const W: Slot = 0;
    pub const H: Slot = 1;
    pub const XMIN: Slot = 2;
    pub const XMAX: Slot = 3;
    pub const YMIN: Slot = 4;
    pub const YMAX: Slot = 5;
    pub const MAX_ITER: Slot = 6;
    const PX: Slot = 7;
    const PY: Slot = 8;
    const CX: Slot = 9;
    const CY: Slot = 10;
    const ZR: Slot = 11;
    const ZI: Slot = 12;
    const ZR2: Slot = 13;
    const ZI2: Slot = 14;
    const N: Slot = 15;
    pub const SLOTS: usize = 16;

    pub const OUT: ArrayId = 0;

    pub fn program() -> Vec<Stmt> {
        let escape = vec![
            set(ZR2, var(ZR) * var(ZR)),
            set(ZI2, var(ZI) * var(ZI)),
            when(gt(var(ZR2) + var(ZI2), lit(4.0)), vec![Stmt::Break], vec![]),
            set(ZI, lit(2.0) * var(ZR) * var(ZI) + var(CY)),
            set(ZR, var(ZR2) - var(ZI2) + var(CX)),
            set(N, var(N) + word(1)),
        ];
        let pixel = vec![
            set(CX, var(XMIN) + (var(XMAX) - var(XMIN)) * to_float(var(PX)) / to_float(var(W))),
            set(ZR, lit(0.0)),
            set(ZI, lit(0.0)),
            set(N, word(0)),
            repeat_while(lt(var(N), var(MAX_ITER)), escape),
            store(OUT, var(PY) * var(W) + var(PX), var(N)),
            set(PX, var(PX) + word(1)),
        ];
        vec![
            set(PY, word(0)),
            repeat_while(
                lt(var(PY), var(H)),
                vec![
                    set(CY, var(YMIN) + (var(YMAX) - var(YMIN)) * to_float(var(PY)) / to_float(var(H))),
                    set(PX, word(0)),
                    repeat_while(lt(var(PX), var(W)), pixel),
                    set(PY, var(PY) + word(1)),
                ],
            ),
        ]
    }
}

pub mod hash {
    use super::*;

    pub const LEN: Slot = 0;
    pub const ITERATIONS: Slot = 1;
    pub const BLOCKS: Slot = 2;
    pub const ACC: Slot = 3;
    const BLK: Slot = 4;
    const H: Slot = 5;
    const COUNT: Slot = 6;
    const IT: Slot = 7;
    const BI: Slot = 8;
    pub const SLOTS: usize = 9;

    pub const DATA: ArrayId = 0;
    pub const DIGESTS: ArrayId = 1;

    fn mix(h: Expr, b: Expr) -> Expr {
        rotl(xor(h * word(33), b), word(5))
    }

    pub fn program() -> Vec<Stmt> {
        let block = HASH_BLOCK as u32;
        vec![
            set(BLK, word(0)),
            repeat_while(
                lt(var(BLK), var(BLOCKS)),
                vec![
                    set(H, xor(word(HASH_SEED), var(BLK))),
                    set(COUNT, min(var(ITERATIONS) - var(BLK) * word(block), word(block))),
                    set(IT, word(0)),
                    repeat_while(
                        lt(var(IT), var(COUNT)),
                        vec![
                            set(BI, word(0)),
                            repeat_while(
                                lt(var(BI), var(LEN)),
                                vec![
                                    set(H, mix(var(H), idx(DATA, var(BI)))),
                                    set(BI, var(BI) + word(1)),
                                ],
                            ),
                            set(IT, var(IT) + word(1)),
                        ],
                    ),
                    store(DIGESTS, var(BLK), var(H)),
                    set(BLK, var(BLK) + word(1)),
                ],
            ),
            set(ACC, word(HASH_SEED)),
            set(BLK, word(0)),
            repeat_while(
                lt(var(BLK), var(BLOCKS)),
                vec![
                    set(ACC, mix(var(ACC), idx(DIGESTS, var(BLK)))),
                    set(BLK, var(BLK) + word(1)),
                ],
            ),
        ]
    }
}

pub mod raytrace {
    use super::*;

    pub const W: Slot = 0;
    pub const H: Slot = 1;
    pub const SAMPLES: Slot = 2;
    const WF: Slot = 3;
    const HF: Slot = 4;
    const SF: Slot = 5;
    const PX: Slot = 6;
    const PY: Slot = 7;
    const S: Slot = 8;
    const PIXEL: Slot = 9;
    const KEY: Slot = 10;
    const X: Slot = 11;
    const JX: Slot = 12;
    const JY: Slot = 13;
    const U: Slot = 14;
    const V: Slot = 15;
    const LEN: Slot = 16;
    const DX: Slot = 17;
    const DY: Slot = 18;
    const DZ: Slot = 19;
    const B: Slot = 20;
    const C: Slot = 21;
    const DISC: Slot = 22;
    const SQ: Slot = 23;
    const T: Slot = 24;
    const NX: Slot = 25;
    const NY: Slot = 26;
    const NZ: Slot = 27;
    const DIFF: Slot = 28;
    const CR: Slot = 29;
    const CG: Slot = 30;
    const CB: Slot = 31;
    const SR: Slot = 32;
    const SG: Slot = 33;
    const SB: Slot = 34;
    const BASE: Slot = 35;
    pub const SLOTS: usize = 36;

    pub const OUT: ArrayId = 0;

    /// lowbias32 applied to slot `X` in place.
    fn scramble() -> Vec<Stmt> {
        vec![
            set(X, xor(var(X), shr(var(X), word(16)))),
            set(X, var(X) * word(0x7feb_352d)),
            set(X, xor(var(X), shr(var(X), word(15)))),
            set(X, var(X) * word(0x846c_a68b)),
            set(X, xor(var(X), shr(var(X), word(16)))),
        ]
    }

    fn unit_offset() -> Expr {
        to_float(shr(var(X), word(8))) / lit(16_777_216.0)
    }

    fn background() -> Vec<Stmt> {
        vec![
            set(CR, lit(BACKGROUND[0])),
            set(CG, lit(BACKGROUND[1])),
            set(CB, lit(BACKGROUND[2])),
        ]
    }

    fn shade() -> Vec<Stmt> {
        let normal = |d: Slot, axis: usize| {
            (var(d) * var(T) - lit(SPHERE_CENTER[axis])) / lit(SPHERE_RADIUS)
        };
        vec![
            set(NX, normal(DX, 0)),
            set(NY, normal(DY, 1)),
            set(NZ, normal(DZ, 2)),
            set(
                DIFF,
                max(
                    lit(0.0),
                    var(NX) * lit(LIGHT_DIR[0]) + var(NY) * lit(LIGHT_DIR[1]) + var(NZ) * lit(LIGHT_DIR[2]),
                ),
            ),
            set(CR, lit(ALBEDO[0]) * var(DIFF)),
            set(CG, lit(ALBEDO[1]) * var(DIFF)),
            set(CB, lit(ALBEDO[2]) * var(DIFF)),
        ]
    }

    fn trace() -> Vec<Stmt> {
        let oc = [
            0.0 - SPHERE_CENTER[0],
            0.0 - SPHERE_CENTER[1],
            0.0 - SPHERE_CENTER[2],
        ];
        vec![
            set(
                B,
                lit(oc[0]) * var(DX) + lit(oc[1]) * var(DY) + lit(oc[2]) * var(DZ),
            ),
            set(
                C,
                lit(oc[0]) * lit(oc[0]) + lit(oc[1]) * lit(oc[1]) + lit(oc[2]) * lit(oc[2])
                    - lit(SPHERE_RADIUS) * lit(SPHERE_RADIUS),
            ),
            set(DISC, var(B) * var(B) - var(C)),
            when(
                lt(var(DISC), lit(0.0)),
                background(),
                vec![
                    set(SQ, sqrt(var(DISC))),
                    set(T, neg(var(B)) - var(SQ)),
                    when(lt(var(T), lit(0.0)), vec![set(T, neg(var(B)) + var(SQ))], vec![]),
                    when(lt(var(T), lit(0.0)), background(), shade()),
                ],
            ),
        ]
    }

    fn sample() -> Vec<Stmt> {
        let mut body = vec![set(KEY, (var(PIXEL) * var(SAMPLES) + var(S)) * word(2)), set(X, var(KEY))];
        body.extend(scramble());
        body.push(set(JX, unit_offset()));
        body.push(set(X, var(KEY) + word(1)));
        body.extend(scramble());
        body.push(set(JY, unit_offset()));
        body.extend([
            set(
                U,
                (lit(2.0) * (to_float(var(PX)) + var(JX)) / var(WF) - lit(1.0)) * (var(WF) / var(HF)),
            ),
            set(V, lit(1.0) - lit(2.0) * (to_float(var(PY)) + var(JY)) / var(HF)),
            set(LEN, sqrt(var(U) * var(U) + var(V) * var(V) + lit(1.0))),
            set(DX, var(U) / var(LEN)),
            set(DY, var(V) / var(LEN)),
            set(DZ, lit(-1.0) / var(LEN)),
        ]);
        body.extend(trace());
        body.extend([
            set(SR, var(SR) + var(CR)),
            set(SG, var(SG) + var(CG)),
            set(SB, var(SB) + var(CB)),
            set(S, var(S) + word(1)),
        ]);
        body
    }

    pub fn program() -> Vec<Stmt> {
        let pixel = vec![
            set(PIXEL, var(PY) * var(W) + var(PX)),
            set(SR, lit(0.0)),
            set(SG, lit(0.0)),
            set(SB, lit(0.0)),
            set(S, word(0)),
            repeat_while(lt(var(S), var(SAMPLES)), sample()),
            set(BASE, var(PIXEL) * word(3)),
            store(OUT, var(BASE), var(SR) / var(SF)),
            store(OUT, var(BASE) + word(1), var(SG) / var(SF)),
            store(OUT, var(BASE) + word(2), var(SB) / var(SF)),
            set(PX, var(PX) + word(1)),
        ];
        vec![
            set(WF, to_float(var(W))),
            set(HF, to_float(var(H))),
            set(SF, to_float(var(SAMPLES))),
            set(PY, word(0)),
            repeat_while(
                lt(var(PY), var(H)),
                vec![
                    set(PX, word(0)),
                    repeat_while(lt(var(PX), var(W)), pixel),
                    set(PY, var(PY) + word(1)),
                ],
            ),
        ]
    }
}
