use bitflags::bitflags;

bitflags! {
    /// The lifecycle events pending for one element, as of the end of the
    /// frame that raised them. More than one bit can be set (an element
    /// created and immediately destroyed within the same frame carries
    /// both); `EventPipeline::process` resolves that overlap by letting
    /// destroy take precedence over move, and treating create as
    /// requiring no action of its own (the element already exists by the
    /// time anything observes the flag).
    #[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
    pub struct EventFlags: u8 {
        const CREATE  = 0b001;
        const MOVE    = 0b010;
        const DESTROY = 0b100;
    }
}
