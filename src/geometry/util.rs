//! # スカラー補助関数
//!
//! 浮動小数点の許容誤差付き比較、安全な平方根・逆三角関数、二次方程式の解法を提供します。
//! すべて状態を持たない純粋関数です。

/// 許容誤差付き比較の精度クラス
///
/// IEEE-754 のビット表現上での ULP 差で比較します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    /// 約5桁
    P5,
    /// 約7桁
    P7,
    /// 約9桁
    P9,
    /// 約13桁（既定）
    #[default]
    P13,
}

impl Precision {
    /// 許容する最大 ULP 差
    pub fn max_ulps(self) -> i64 {
        match self {
            Precision::P5 => 1_i64 << 40,
            Precision::P7 => 1_i64 << 34,
            Precision::P9 => 1_i64 << 27,
            Precision::P13 => 16348,
        }
    }

    /// ゼロ近傍で同一とみなす絶対値の上限
    pub fn zero_band(self) -> f64 {
        match self {
            Precision::P5 => 1.0e-5,
            Precision::P7 => 1.0e-7,
            Precision::P9 => 1.0e-9,
            Precision::P13 => 1.0e-13,
        }
    }
}

/// 符号付き整数として辞書順に並ぶビット表現
fn ordered_bits(x: f64) -> i64 {
    let bits = x.to_bits() as i64;
    if bits < 0 { i64::MIN.wrapping_sub(bits) } else { bits }
}

/// 指定精度で `a` と `b` がほぼ等しいかを判定
///
/// NaN と無限大はいかなる値ともほぼ等しくなりません（完全一致を除く）。
pub fn almost_equals_prec(a: f64, b: f64, prec: Precision) -> bool {
    if a == b {
        return true;
    }
    if a == 0.0 || b == 0.0 {
        let band = prec.zero_band();
        if a.abs() < band && b.abs() < band {
            return true;
        }
    }
    if !(a < b || b < a) {
        return false;
    }
    if a.is_infinite() || b.is_infinite() {
        return false;
    }
    let diff = (ordered_bits(a) as i128 - ordered_bits(b) as i128).abs();
    diff <= prec.max_ulps() as i128
}

/// 既定精度（P13）での近似等価
pub fn almost_equals(a: f64, b: f64) -> bool {
    almost_equals_prec(a, b, Precision::P13)
}

/// `a < b` かつほぼ等しくない
pub fn almost_less_prec(a: f64, b: f64, prec: Precision) -> bool {
    !almost_equals_prec(a, b, prec) && a < b
}

pub fn almost_less(a: f64, b: f64) -> bool {
    almost_less_prec(a, b, Precision::P13)
}

/// `a > b` かつほぼ等しくない
pub fn almost_greater_prec(a: f64, b: f64, prec: Precision) -> bool {
    !almost_equals_prec(a, b, prec) && a > b
}

pub fn almost_greater(a: f64, b: f64) -> bool {
    almost_greater_prec(a, b, Precision::P13)
}

/// `a <= b` またはほぼ等しい
pub fn almost_leq_prec(a: f64, b: f64, prec: Precision) -> bool {
    a < b || almost_equals_prec(a, b, prec)
}

pub fn almost_leq(a: f64, b: f64) -> bool {
    almost_leq_prec(a, b, Precision::P13)
}

/// `a >= b` またはほぼ等しい
pub fn almost_geq_prec(a: f64, b: f64, prec: Precision) -> bool {
    a > b || almost_equals_prec(a, b, prec)
}

pub fn almost_geq(a: f64, b: f64) -> bool {
    almost_geq_prec(a, b, Precision::P13)
}

pub fn sq(x: f64) -> f64 {
    x * x
}

/// 負の入力を 0 に丸める平方根
pub fn sqrt_safe(x: f64) -> f64 {
    x.max(0.0).sqrt()
}

/// 原点で 0 を返す atan2
pub fn atan2_safe(y: f64, x: f64) -> f64 {
    if y == 0.0 && x == 0.0 {
        return 0.0;
    }
    y.atan2(x)
}

pub fn asin_safe(x: f64) -> f64 {
    x.clamp(-1.0, 1.0).asin()
}

pub fn acos_safe(x: f64) -> f64 {
    x.clamp(-1.0, 1.0).acos()
}

/// 符号（0 以上なら +1）
pub fn sign(x: f64) -> i32 {
    if x >= 0.0 { 1 } else { -1 }
}

/// 二次方程式の判別式
pub fn discr(a: f64, b: f64, c: f64) -> f64 {
    sq(b) - 4.0 * a * c
}

/// `a·x² + b·x + c = 0` の根（`eps` = ±1 で選択）
///
/// 実根が存在しない場合は NaN を返します。
pub fn root(a: f64, b: f64, c: f64, eps: i32) -> f64 {
    if a == 0.0 && b == 0.0 {
        return f64::NAN;
    }
    if a == 0.0 {
        return -c / b;
    }
    let sqb = sq(b);
    let ac = 4.0 * a * c;
    if almost_equals(sqb, ac) || sqb > ac {
        return (-b + eps as f64 * sqrt_safe(sqb - ac)) / (2.0 * a);
    }
    f64::NAN
}

/// `a·x² + 2b·x + c = 0` の根（`eps` = ±1 で選択）
pub fn root2b(a: f64, b: f64, c: f64, eps: i32) -> f64 {
    if a == 0.0 && b == 0.0 {
        return f64::NAN;
    }
    if a == 0.0 {
        return -c / (2.0 * b);
    }
    let sqb = sq(b);
    let ac = a * c;
    if almost_equals(sqb, ac) || sqb > ac {
        return (-b + eps as f64 * sqrt_safe(sqb - ac)) / a;
    }
    f64::NAN
}

/// 文字列の大小関係（`s1 >= s2` のとき真）
pub fn less_or_equal(s1: &str, s2: &str) -> bool {
    s1 >= s2
}
