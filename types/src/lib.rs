pub mod combined;

pub mod phase0 {
    pub mod consts;
    pub mod containers;
    pub mod primitives;
}

pub mod altair {
    pub mod containers;
}

pub mod bellatrix {
    pub mod containers;
    pub mod primitives;

    mod container_impls;
}

pub mod misc;
