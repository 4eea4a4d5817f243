//! Scenario tests of the scan engine against a scripted network.

pub mod fixture;

#[cfg(test)]
mod discovery {
    mod integration;
}

#[cfg(test)]
mod scanning {
    mod integration;
}

#[cfg(test)]
mod survey {
    mod integration;
}
