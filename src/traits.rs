use crate::atom::{Aromaticity, Radical};
use crate::bond::BondOrder;

pub trait HasAtomicNum {
    fn atomic_num(&self) -> u8;
}

pub trait HasFormalCharge {
    fn formal_charge(&self) -> i8;
}

pub trait HasRadical {
    fn radical(&self) -> Radical;
}

pub trait HasHydrogenCount {
    fn hydrogen_count(&self) -> u8;
}

pub trait HasAromaticity {
    fn aromaticity(&self) -> Aromaticity;
}

pub trait HasBondOrder {
    fn bond_order(&self) -> BondOrder;
}
