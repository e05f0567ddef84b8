use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Mul};

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::monomial::Monomial;
use crate::symbol::Symbol;

/// Tagged algebraic expression used for moment values and constraint items.
///
/// Trees may be built by hand (for instance when a moment value is read from
/// a file) and keep their shape until they take part in arithmetic. The
/// arithmetic operators and [`Expr::canonical`] return the canonical form: an
/// expanded sum of `coefficient * monomial` terms with the constant term
/// first, unit coefficients omitted, and zero collapsed to `Const(0)`.
/// Derived equality is structural, so algebraic equality means comparing
/// canonical forms.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Numeric constant.
    Const(Complex64),
    /// Symbol leaf.
    Symbol(Symbol),
    /// Ordered product of the children.
    Product(Vec<Expr>),
    /// Sum of the children.
    Sum(Vec<Expr>),
}

type TermKey = (usize, Monomial);
type Terms = BTreeMap<TermKey, Complex64>;

fn is_exact_zero(value: Complex64) -> bool {
    value.re == 0.0 && value.im == 0.0
}

fn single_term(monomial: Monomial, coeff: Complex64) -> Terms {
    let mut terms = Terms::new();
    if !is_exact_zero(coeff) {
        terms.insert((monomial.degree(), monomial), coeff);
    }
    terms
}

fn add_terms(acc: &mut Terms, rhs: Terms) {
    for (key, coeff) in rhs {
        *acc.entry(key).or_insert_with(|| Complex64::new(0.0, 0.0)) += coeff;
    }
    acc.retain(|_, coeff| !is_exact_zero(*coeff));
}

fn multiply_terms(lhs: &Terms, rhs: &Terms) -> Terms {
    let mut product = Terms::new();
    for ((_, left), left_coeff) in lhs {
        for ((_, right), right_coeff) in rhs {
            let monomial = left.product(right);
            *product
                .entry((monomial.degree(), monomial))
                .or_insert_with(|| Complex64::new(0.0, 0.0)) += left_coeff * right_coeff;
        }
    }
    product.retain(|_, coeff| !is_exact_zero(*coeff));
    product
}

fn term_expr(monomial: &Monomial, coeff: Complex64) -> Expr {
    if monomial.is_identity() {
        return Expr::Const(coeff);
    }
    let mut factors = Vec::with_capacity(monomial.degree() + 1);
    if coeff != Complex64::new(1.0, 0.0) {
        factors.push(Expr::Const(coeff));
    }
    factors.extend(monomial.factors().cloned().map(Expr::Symbol));
    if factors.len() == 1 {
        factors.remove(0)
    } else {
        Expr::Product(factors)
    }
}

impl Expr {
    /// Exact zero.
    pub fn zero() -> Self {
        Expr::Const(Complex64::new(0.0, 0.0))
    }

    /// Exact one.
    pub fn one() -> Self {
        Expr::Const(Complex64::new(1.0, 0.0))
    }

    /// Real constant.
    pub fn real(value: f64) -> Self {
        Expr::Const(Complex64::new(value, 0.0))
    }

    /// Complex constant.
    pub fn complex(re: f64, im: f64) -> Self {
        Expr::Const(Complex64::new(re, im))
    }

    /// Canonical expression of a monomial: `1`, a symbol, or a product of symbols.
    pub fn from_monomial(monomial: &Monomial) -> Self {
        term_expr(monomial, Complex64::new(1.0, 0.0))
    }

    /// Children of a product or sum; empty for leaves.
    pub fn args(&self) -> &[Expr] {
        match self {
            Expr::Product(children) | Expr::Sum(children) => children,
            Expr::Const(_) | Expr::Symbol(_) => &[],
        }
    }

    /// Structural constant test: leaves are constant iff numeric, nodes iff all
    /// children are.
    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Const(_) => true,
            Expr::Symbol(_) => false,
            Expr::Product(children) | Expr::Sum(children) => {
                children.iter().all(Expr::is_constant)
            }
        }
    }

    /// Numeric value of a constant expression.
    pub fn constant_value(&self) -> Option<Complex64> {
        match self {
            Expr::Const(value) => Some(*value),
            Expr::Symbol(_) => None,
            Expr::Product(children) => children
                .iter()
                .try_fold(Complex64::new(1.0, 0.0), |acc, child| {
                    child.constant_value().map(|value| acc * value)
                }),
            Expr::Sum(children) => children
                .iter()
                .try_fold(Complex64::new(0.0, 0.0), |acc, child| {
                    child.constant_value().map(|value| acc + value)
                }),
        }
    }

    fn collect_terms(&self) -> Terms {
        match self {
            Expr::Const(value) => single_term(Monomial::identity(), *value),
            Expr::Symbol(symbol) => {
                single_term(Monomial::from_symbol(symbol.clone()), Complex64::new(1.0, 0.0))
            }
            Expr::Product(children) => {
                let mut acc = single_term(Monomial::identity(), Complex64::new(1.0, 0.0));
                for child in children {
                    acc = multiply_terms(&acc, &child.collect_terms());
                    if acc.is_empty() {
                        break;
                    }
                }
                acc
            }
            Expr::Sum(children) => {
                let mut acc = Terms::new();
                for child in children {
                    add_terms(&mut acc, child.collect_terms());
                }
                acc
            }
        }
    }

    fn from_term_map(terms: &Terms) -> Self {
        let mut rendered: Vec<Expr> = terms
            .iter()
            .map(|((_, monomial), coeff)| term_expr(monomial, *coeff))
            .collect();
        match rendered.len() {
            0 => Expr::zero(),
            1 => rendered.remove(0),
            _ => Expr::Sum(rendered),
        }
    }

    /// Expanded `coefficient * monomial` terms ordered by degree, then monomial.
    pub fn terms(&self) -> Vec<(Monomial, Complex64)> {
        self.collect_terms()
            .into_iter()
            .map(|((_, monomial), coeff)| (monomial, coeff))
            .collect()
    }

    /// Builds the canonical expression from `(monomial, coefficient)` terms.
    pub fn from_terms(terms: impl IntoIterator<Item = (Monomial, Complex64)>) -> Self {
        let mut acc = Terms::new();
        for (monomial, coeff) in terms {
            add_terms(&mut acc, single_term(monomial, coeff));
        }
        Self::from_term_map(&acc)
    }

    /// Canonical form of this expression.
    pub fn canonical(&self) -> Self {
        Self::from_term_map(&self.collect_terms())
    }

    /// Returns whether both expressions expand to the same terms.
    pub fn algebraic_eq(&self, other: &Expr) -> bool {
        self.collect_terms() == other.collect_terms()
    }

    /// Returns whether the expression expands to zero.
    pub fn is_zero(&self) -> bool {
        self.collect_terms().is_empty()
    }

    /// The monomial this expression equals, if it is a single unit-coefficient term.
    pub fn as_monomial(&self) -> Option<Monomial> {
        let mut terms = self.collect_terms();
        if terms.len() != 1 {
            return None;
        }
        let ((_, monomial), coeff) = terms.pop_first()?;
        (coeff == Complex64::new(1.0, 0.0)).then_some(monomial)
    }

    /// Multiplies every term by a numeric factor.
    pub fn scale(&self, factor: Complex64) -> Self {
        self * &Expr::Const(factor)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::real(value)
    }
}

impl From<Complex64> for Expr {
    fn from(value: Complex64) -> Self {
        Expr::Const(value)
    }
}

impl From<Symbol> for Expr {
    fn from(symbol: Symbol) -> Self {
        Expr::Symbol(symbol)
    }
}

impl From<&Monomial> for Expr {
    fn from(monomial: &Monomial) -> Self {
        Expr::from_monomial(monomial)
    }
}

impl From<Monomial> for Expr {
    fn from(monomial: Monomial) -> Self {
        Expr::from_monomial(&monomial)
    }
}

impl Mul for &Expr {
    type Output = Expr;

    fn mul(self, rhs: &Expr) -> Expr {
        Expr::from_term_map(&multiply_terms(&self.collect_terms(), &rhs.collect_terms()))
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        &self * &rhs
    }
}

impl Add for &Expr {
    type Output = Expr;

    fn add(self, rhs: &Expr) -> Expr {
        let mut acc = self.collect_terms();
        add_terms(&mut acc, rhs.collect_terms());
        Expr::from_term_map(&acc)
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        &self + &rhs
    }
}

fn fmt_constant(value: &Complex64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if value.im == 0.0 {
        write!(f, "{}", value.re)
    } else {
        write!(f, "({}{:+}i)", value.re, value.im)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(value) => fmt_constant(value, f),
            Expr::Symbol(symbol) => write!(f, "{symbol}"),
            Expr::Product(children) => {
                if children.is_empty() {
                    return f.write_str("1");
                }
                for (idx, child) in children.iter().enumerate() {
                    if idx > 0 {
                        f.write_str("*")?;
                    }
                    match child {
                        Expr::Sum(_) => write!(f, "({child})")?,
                        _ => write!(f, "{child}")?,
                    }
                }
                Ok(())
            }
            Expr::Sum(children) => {
                if children.is_empty() {
                    return f.write_str("0");
                }
                for (idx, child) in children.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" + ")?;
                    }
                    write!(f, "{child}")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expr({self})")
    }
}
