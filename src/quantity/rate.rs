quantity!(
    /// Price of one kilowatt-hour in the tariff currency.
    KilowattHourRate, suffix: "/kWh", precision: 3
);
