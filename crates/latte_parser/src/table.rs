//! LALR(1) table construction from a declarative grammar.
//!
//! [`Grammar`] collects productions (each paired with a caller-supplied
//! payload, normally its semantic action) and yacc-style precedence
//! declarations. [`Grammar::build`] then runs the classic construction:
//! LR(1) items, states merged by LR(0) core, lookaheads re-propagated to a
//! fixed point. Conflicts resolve the yacc way: precedence and
//! associativity first, then shift over reduce, then the earlier rule.
//! Every resolution is logged at trace level.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use latte_syntax::SyntaxKind;

use crate::engine::{ParseTable, Rule};

/// How equal-precedence shift/reduce ties break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Assoc {
    Left,
    Right,
    NonAssoc,
}

/// An LR(0) item: rule id and dot position.
type Item = (u16, u8);
/// Items of a state's kernel with the lookaheads gathered so far.
type Kernel = BTreeMap<Item, BTreeSet<u16>>;
/// A kernel stripped of lookaheads, the identity LALR merges by.
type Core = BTreeSet<Item>;

pub(crate) struct Grammar<A> {
    names: Vec<String>,
    ids: HashMap<String, u16>,
    prods: Vec<Production>,
    payloads: Vec<A>,
    prec: HashMap<u16, (u8, Assoc)>,
    levels: u8,
    start: u16,
}

struct Production {
    lhs: u16,
    rhs: Vec<u16>,
    name: &'static str,
    prec_sym: Option<u16>,
}

impl<A> Grammar<A> {
    /// An empty grammar deriving `start`. Terminal symbols are pre-interned
    /// so their ids equal the token tag discriminants; rule 0 is the
    /// augmented start production.
    pub fn new(start: &str) -> Grammar<A> {
        let names: Vec<String> = SyntaxKind::all().map(|k| k.name().to_string()).collect();
        let ids = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i as u16))
            .collect();
        let mut g = Grammar {
            names,
            ids,
            prods: Vec::new(),
            payloads: Vec::new(),
            prec: HashMap::new(),
            levels: 0,
            start: 0,
        };
        let accept = g.intern("$accept");
        let start_id = g.intern(start);
        g.prods.push(Production {
            lhs: accept,
            rhs: vec![start_id],
            name: "$accept",
            prec_sym: None,
        });
        g.start = start_id;
        g
    }

    /// Declares a left-associative precedence level. Later declarations
    /// bind tighter.
    pub fn left(&mut self, syms: &str) {
        self.declare(syms, Assoc::Left);
    }

    pub fn right(&mut self, syms: &str) {
        self.declare(syms, Assoc::Right);
    }

    pub fn nonassoc(&mut self, syms: &str) {
        self.declare(syms, Assoc::NonAssoc);
    }

    fn declare(&mut self, syms: &str, assoc: Assoc) {
        self.levels += 1;
        for name in syms.split_whitespace() {
            let id = self.intern(name);
            self.prec.insert(id, (self.levels, assoc));
        }
    }

    /// Adds `lhs -> rhs`, with `rhs` a space-separated symbol list (empty
    /// for an epsilon production).
    pub fn rule(&mut self, lhs: &'static str, rhs: &str, payload: A) {
        self.add(lhs, rhs, None, payload);
    }

    /// Adds a production whose conflict precedence comes from `prec`
    /// instead of its rightmost terminal.
    pub fn rule_prec(&mut self, lhs: &'static str, rhs: &str, prec: &str, payload: A) {
        self.add(lhs, rhs, Some(prec), payload);
    }

    fn add(&mut self, lhs: &'static str, rhs: &str, prec: Option<&str>, payload: A) {
        let lhs_id = self.intern(lhs);
        let rhs_ids = rhs.split_whitespace().map(|s| self.intern(s)).collect();
        let prec_sym = prec.map(|p| self.intern(p));
        self.prods.push(Production {
            lhs: lhs_id,
            rhs: rhs_ids,
            name: lhs,
            prec_sym,
        });
        self.payloads.push(payload);
    }

    fn intern(&mut self, name: &str) -> u16 {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.names.len() as u16;
        self.ids.insert(name.to_string(), id);
        self.names.push(name.to_string());
        id
    }

    /// Runs the construction. Returns the finished table and the per-rule
    /// payloads, indexed by rule id minus one (rule 0 has none).
    pub fn build(self) -> (ParseTable, Vec<A>) {
        let Grammar { names, ids, prods, payloads, prec, start, .. } = self;
        let mut builder = Builder::new(&prods, &prec, &names);
        builder.build_states();
        let actions = builder.rows();
        log::debug!(
            "parse table ready: {} states over {} rules",
            actions.len(),
            prods.len()
        );

        let rules = prods
            .iter()
            .map(|p| Rule { lhs: p.lhs, len: p.rhs.len() as u8, name: p.name })
            .collect();
        let table = ParseTable {
            actions,
            rules,
            names,
            ids,
            first_nonterminal: SyntaxKind::__LAST as u16,
            eof: SyntaxKind::EOF as u16,
            start,
        };
        (table, payloads)
    }
}

enum Winner {
    Shift,
    Reduce,
    Neither,
}

struct Builder<'g> {
    prods: &'g [Production],
    prec: &'g HashMap<u16, (u8, Assoc)>,
    names: &'g [String],
    first_nt: u16,
    eof: u16,
    /// Productions of each nonterminal, by symbol id.
    prods_of: Vec<Vec<usize>>,
    nullable: Vec<bool>,
    first: Vec<BTreeSet<u16>>,
    /// Effective precedence of each rule: the `rule_prec` override or the
    /// rightmost terminal that has one.
    rule_prec: Vec<Option<(u8, Assoc)>>,
    states: Vec<Kernel>,
    transitions: Vec<BTreeMap<u16, usize>>,
    index: HashMap<Core, usize>,
}

impl<'g> Builder<'g> {
    fn new(
        prods: &'g [Production],
        prec: &'g HashMap<u16, (u8, Assoc)>,
        names: &'g [String],
    ) -> Builder<'g> {
        let first_nt = SyntaxKind::__LAST as u16;
        let nsyms = names.len();

        let mut prods_of: Vec<Vec<usize>> = vec![Vec::new(); nsyms];
        for (i, p) in prods.iter().enumerate() {
            prods_of[p.lhs as usize].push(i);
        }
        for p in prods {
            for &sym in &p.rhs {
                debug_assert!(
                    sym < first_nt || !prods_of[sym as usize].is_empty(),
                    "{} has no productions",
                    names[sym as usize]
                );
            }
        }

        let mut nullable = vec![false; nsyms];
        let mut first: Vec<BTreeSet<u16>> = (0..nsyms)
            .map(|i| {
                let mut set = BTreeSet::new();
                if (i as u16) < first_nt {
                    set.insert(i as u16);
                }
                set
            })
            .collect();
        loop {
            let mut changed = false;
            for p in prods {
                let lhs = p.lhs as usize;
                let mut all_nullable = true;
                for &sym in &p.rhs {
                    let add: Vec<u16> = first[sym as usize]
                        .iter()
                        .copied()
                        .filter(|s| !first[lhs].contains(s))
                        .collect();
                    if !add.is_empty() {
                        first[lhs].extend(add);
                        changed = true;
                    }
                    if !nullable[sym as usize] {
                        all_nullable = false;
                        break;
                    }
                }
                if all_nullable && !nullable[lhs] {
                    nullable[lhs] = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        let rule_prec = prods
            .iter()
            .map(|p| {
                p.prec_sym
                    .or_else(|| p.rhs.iter().rev().copied().find(|&s| s < first_nt))
                    .and_then(|s| prec.get(&s).copied())
            })
            .collect();

        Builder {
            prods,
            prec,
            names,
            first_nt,
            eof: SyntaxKind::EOF as u16,
            prods_of,
            nullable,
            first,
            rule_prec,
            states: Vec::new(),
            transitions: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn name(&self, sym: u16) -> &str {
        self.names.get(sym as usize).map(|s| s.as_str()).unwrap_or("?")
    }

    fn first_of(&self, seq: &[u16]) -> BTreeSet<u16> {
        let mut out = BTreeSet::new();
        for &sym in seq {
            out.extend(self.first[sym as usize].iter().copied());
            if !self.nullable[sym as usize] {
                break;
            }
        }
        out
    }

    fn seq_nullable(&self, seq: &[u16]) -> bool {
        seq.iter().all(|&sym| self.nullable[sym as usize])
    }

    /// The LR(1) closure of a kernel, as item -> lookaheads.
    fn closure(&self, kernel: &Kernel) -> Kernel {
        let mut items = kernel.clone();
        let mut work: Vec<Item> = items.keys().copied().collect();
        while let Some((rule, dot)) = work.pop() {
            let rhs = &self.prods[rule as usize].rhs;
            let next = match rhs.get(dot as usize) {
                Some(&next) if next >= self.first_nt => next,
                _ => continue,
            };
            let rest = &rhs[dot as usize + 1..];
            let mut follow = self.first_of(rest);
            if self.seq_nullable(rest) {
                let inherited = items[&(rule, dot)].clone();
                follow.extend(inherited);
            }
            for &prod in &self.prods_of[next as usize] {
                let entry = items.entry((prod as u16, 0)).or_default();
                let before = entry.len();
                entry.extend(follow.iter().copied());
                if entry.len() != before {
                    work.push((prod as u16, 0));
                }
            }
        }
        items
    }

    /// Discovers the state machine, merging same-core states and
    /// reprocessing any state whose lookaheads grow.
    fn build_states(&mut self) {
        let mut eof_only = BTreeSet::new();
        eof_only.insert(self.eof);
        let mut start = Kernel::new();
        start.insert((0, 0), eof_only);
        self.index.insert(start.keys().copied().collect(), 0);
        self.states.push(start);
        self.transitions.push(BTreeMap::new());

        let mut work = vec![0usize];
        while let Some(i) = work.pop() {
            let items = self.closure(&self.states[i]);

            let mut moves: BTreeMap<u16, Kernel> = BTreeMap::new();
            for (&(rule, dot), follow) in &items {
                if let Some(&sym) = self.prods[rule as usize].rhs.get(dot as usize) {
                    moves
                        .entry(sym)
                        .or_default()
                        .entry((rule, dot + 1))
                        .or_default()
                        .extend(follow.iter().copied());
                }
            }

            for (sym, kernel) in moves {
                let core: Core = kernel.keys().copied().collect();
                let target = match self.index.get(&core).copied() {
                    Some(j) => {
                        let mut grew = false;
                        for (item, follow) in kernel {
                            let slot = self.states[j].entry(item).or_default();
                            let before = slot.len();
                            slot.extend(follow);
                            if slot.len() != before {
                                grew = true;
                            }
                        }
                        if grew && !work.contains(&j) {
                            work.push(j);
                        }
                        j
                    }
                    None => {
                        let j = self.states.len();
                        self.states.push(kernel);
                        self.transitions.push(BTreeMap::new());
                        self.index.insert(core, j);
                        work.push(j);
                        j
                    }
                };
                self.transitions[i].insert(sym, target);
            }
        }
    }

    /// Flattens states into action rows, resolving conflicts as they
    /// surface.
    fn rows(&self) -> Vec<HashMap<u16, i32>> {
        let mut rows: Vec<HashMap<u16, i32>> = vec![HashMap::new(); self.states.len()];
        for (i, moves) in self.transitions.iter().enumerate() {
            for (&sym, &target) in moves {
                debug_assert!(target != 0, "no transition may re-enter the start state");
                rows[i].insert(sym, target as i32);
            }
        }

        for i in 0..self.states.len() {
            for ((rule, dot), follow) in self.closure(&self.states[i]) {
                let prod = &self.prods[rule as usize];
                if (dot as usize) < prod.rhs.len() {
                    continue;
                }
                for sym in follow {
                    if rule == 0 {
                        debug_assert_eq!(sym, self.eof, "$accept completes only at eof");
                        rows[i].insert(sym, 0);
                        continue;
                    }
                    match rows[i].get(&sym).copied() {
                        None => {
                            rows[i].insert(sym, -(rule as i32));
                        }
                        Some(standing) if standing > 0 => match self.resolve(rule as usize, sym) {
                            Winner::Shift => {
                                log::trace!(
                                    "state {}: shift {} over reduce {}",
                                    i,
                                    self.name(sym),
                                    prod.name
                                );
                            }
                            Winner::Reduce => {
                                log::trace!(
                                    "state {}: reduce {} over shift {}",
                                    i,
                                    prod.name,
                                    self.name(sym)
                                );
                                rows[i].insert(sym, -(rule as i32));
                            }
                            Winner::Neither => {
                                log::trace!(
                                    "state {}: {} errors between shift and reduce {}",
                                    i,
                                    self.name(sym),
                                    prod.name
                                );
                                rows[i].remove(&sym);
                            }
                        },
                        Some(standing) => {
                            let other = (-standing) as usize;
                            if (rule as usize) < other {
                                rows[i].insert(sym, -(rule as i32));
                            }
                            log::trace!(
                                "state {}: reduce/reduce on {} between {} and {}",
                                i,
                                self.name(sym),
                                prod.name,
                                self.prods[other].name
                            );
                        }
                    }
                }
            }
        }
        rows
    }

    /// Yacc tie-breaking for a shift/reduce pair.
    fn resolve(&self, rule: usize, look: u16) -> Winner {
        match (self.rule_prec[rule], self.prec.get(&look).copied()) {
            (Some((rule_level, assoc)), Some((look_level, _))) => {
                if rule_level > look_level {
                    Winner::Reduce
                } else if look_level > rule_level {
                    Winner::Shift
                } else {
                    match assoc {
                        Assoc::Left => Winner::Reduce,
                        Assoc::Right => Winner::Shift,
                        Assoc::NonAssoc => Winner::Neither,
                    }
                }
            }
            _ => Winner::Shift,
        }
    }
}
